//! Domain error types
//!
//! This module defines the error hierarchy for dittorm. Backend failures are
//! carried verbatim (status, code, message) inside backend-specific variants so
//! callers see what the service reported, without exposing third-party types.

use thiserror::Error;

/// LeanCloud error code for "class or object doesn't exist".
pub const LEANCLOUD_MISSING_CLASS: i64 = 101;

/// Main dittorm error type
///
/// This is the primary error type used throughout the crate.
#[derive(Debug, Error)]
pub enum DittormError {
    /// Configuration-related errors (unknown storage, missing section, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// LeanCloud-related errors
    #[error("LeanCloud error: {0}")]
    LeanCloud(#[from] LeanCloudError),

    /// Deta Base-related errors
    #[error("Deta error: {0}")]
    Deta(#[from] DetaError),

    /// A where expression could not be read
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl DittormError {
    /// Whether this is LeanCloud's "class or object doesn't exist" error.
    ///
    /// An uninitialized class is indistinguishable from "no matches", so the
    /// LeanCloud model coerces this error into an empty result.
    pub fn is_missing_collection(&self) -> bool {
        matches!(
            self,
            DittormError::LeanCloud(LeanCloudError::Api { code, .. }) if *code == LEANCLOUD_MISSING_CLASS
        )
    }
}

/// LeanCloud-specific errors
#[derive(Debug, Error)]
pub enum LeanCloudError {
    /// Failed to reach the LeanCloud API
    #[error("Failed to connect to LeanCloud: {0}")]
    ConnectionFailed(String),

    /// The API answered with an error body
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Response could not be decoded
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Some sub-requests of a batch failed
    #[error("Batch operation failed: {failed}/{total} requests failed")]
    BatchFailed { failed: usize, total: usize },
}

/// Deta Base-specific errors
#[derive(Debug, Error)]
pub enum DetaError {
    /// Failed to reach the Deta Base API
    #[error("Failed to connect to Deta Base: {0}")]
    ConnectionFailed(String),

    /// Non-success status
    #[error("Request failed: {status} - {message}")]
    RequestFailed { status: u16, message: String },

    /// Response could not be decoded
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Item was rejected by a put
    #[error("Failed to put item: {0}")]
    PutFailed(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for DittormError {
    fn from(err: std::io::Error) -> Self {
        DittormError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DittormError {
    fn from(err: serde_json::Error) -> Self {
        DittormError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DittormError {
    fn from(err: toml::de::Error) -> Self {
        DittormError::Configuration(format!("TOML parse error: {err}"))
    }
}
