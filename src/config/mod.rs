//! Configuration management for dittorm.
//!
//! # Overview
//!
//! dittorm uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `DITTORM_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of the section belonging to the selected backend
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dittorm::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("dittorm.toml")?;
//!
//! println!("Storage: {}", config.storage);
//! println!("Primary key alias: {}", config.primary_key);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`DittormConfig`] - Root: storage backend and primary-key alias
//! - [`ApplicationConfig`] - Log level
//! - [`LeanCloudConfig`] - LeanCloud application credentials and server
//! - [`DetaConfig`] - Deta Base project key and endpoint
//! - [`LoggingConfig`] - Optional rolling file output
//!
//! # Example Configuration
//!
//! ```toml
//! storage = "leancloud"
//! primary_key = "id"
//!
//! [application]
//! log_level = "info"
//!
//! [leancloud]
//! app_id = "your-app-id"
//! app_key = "${LEAN_KEY}"
//! master_key = "${LEAN_MASTER_KEY}"
//! server_url = "https://your-app.api.lncldglobal.com"
//!
//! [deta]
//! project_key = "${DETA_PROJECT_KEY}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DetaConfig, DittormConfig, LeanCloudConfig, LoggingConfig, StorageTarget,
};
pub use secret::{secret_string, SecretString, SecretValue};
