//! Result type alias for dittorm

use super::errors::DittormError;

/// Result type alias for dittorm operations
///
/// # Examples
///
/// ```
/// use dittorm::domain::result::Result;
/// use dittorm::domain::errors::DittormError;
///
/// fn table_name(raw: &str) -> Result<String> {
///     if raw.is_empty() {
///         return Err(DittormError::Validation("table name cannot be empty".to_string()));
///     }
///     Ok(raw.to_string())
/// }
///
/// assert!(table_name("Comment").is_ok());
/// assert!(table_name("").is_err());
/// ```
pub type Result<T> = std::result::Result<T, DittormError>;
