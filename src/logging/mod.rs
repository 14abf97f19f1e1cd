//! Logging and observability
//!
//! Structured logging through `tracing`, with configurable levels and an
//! optional rotating JSON file.
//!
//! # Example
//!
//! ```no_run
//! use dittorm::logging::init_logging;
//! use dittorm::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a filter that a backend cannot enforce and drops
///
/// # Example
///
/// ```no_run
/// use dittorm::log_dropped_filter;
///
/// log_dropped_filter!("deta", "status", "NOT IN is not supported");
/// ```
#[macro_export]
macro_rules! log_dropped_filter {
    ($backend:expr, $field:expr, $reason:expr) => {
        tracing::warn!(
            backend = $backend,
            field = %$field,
            reason = %$reason,
            "Dropping filter the backend cannot apply"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use dittorm::log_error_with_context;
/// use dittorm::domain::DittormError;
///
/// let error = DittormError::Configuration("storage type is required".to_string());
/// log_error_with_context!(&error, "Failed to create model");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
