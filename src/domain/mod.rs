//! Domain models and types for dittorm.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Where expressions** ([`Where`], [`Filter`], [`Complex`], [`Logic`])
//! - **Select options** ([`SelectOptions`]) and record [`Access`] flags
//! - **Records** ([`Record`]) and the primary-key boundary ([`KeyMapping`])
//! - **Error types** ([`DittormError`], [`LeanCloudError`], [`DetaError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use dittorm::domain::{Complex, Logic, SelectOptions, Where};
//!
//! let filter = Where::new()
//!     .eq("status", "approved")
//!     .with_complex(Complex::new(Logic::Or).eq("url", "/a").eq("url_alt", "/a"));
//! let options = SelectOptions::new().limit(10).desc("insertedAt");
//! # let _ = (filter, options);
//! ```

pub mod condition;
pub mod errors;
pub mod options;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use condition::{Complex, Filter, LikePattern, Logic, Operator, Where};
pub use errors::{DetaError, DittormError, LeanCloudError};
pub use options::{Access, SelectOptions};
pub use record::{KeyMapping, Record, DEFAULT_PRIMARY_KEY};
pub use result::Result;
