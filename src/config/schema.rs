//! Configuration schema types
//!
//! This module defines the configuration structure for dittorm.

use crate::config::SecretString;
use crate::domain::{DittormError, DEFAULT_PRIMARY_KEY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage backend selection
///
/// The set of backends is closed; adding one means adding a variant here and
/// an arm to the model factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum StorageTarget {
    /// LeanCloud document service
    LeanCloud,
    /// Deta Base key-value service
    Deta,
}

impl StorageTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTarget::LeanCloud => "leancloud",
            StorageTarget::Deta => "deta",
        }
    }
}

impl TryFrom<String> for StorageTarget {
    type Error = DittormError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for StorageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageTarget {
    type Err = DittormError;

    /// Case-insensitive; empty and unknown names are configuration errors
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "" => Err(DittormError::Configuration(
                "storage type is required".to_string(),
            )),
            "leancloud" => Ok(StorageTarget::LeanCloud),
            "deta" => Ok(StorageTarget::Deta),
            other => Err(DittormError::Configuration(format!(
                "storage type '{other}' is not supported yet"
            ))),
        }
    }
}

/// Main dittorm configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DittormConfig {
    /// Backend used by models created from this configuration
    pub storage: StorageTarget,

    /// Field name callers use for the record identity
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// LeanCloud configuration (required if storage = leancloud)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leancloud: Option<LeanCloudConfig>,

    /// Deta Base configuration (required if storage = deta)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deta: Option<DetaConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DittormConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;

        if self.primary_key.trim().is_empty() {
            return Err("primary_key cannot be empty".to_string());
        }

        match self.storage {
            StorageTarget::LeanCloud => match self.leancloud {
                Some(ref config) => config.validate()?,
                None => {
                    return Err(
                        "leancloud configuration is required when storage = 'leancloud'"
                            .to_string(),
                    )
                }
            },
            StorageTarget::Deta => match self.deta {
                Some(ref config) => config.validate()?,
                None => {
                    return Err("deta configuration is required when storage = 'deta'".to_string())
                }
            },
        }

        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// LeanCloud application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeanCloudConfig {
    /// Application ID
    pub app_id: String,

    /// Application key
    /// Stored securely in memory and automatically zeroized on drop
    pub app_key: SecretString,

    /// Master key; when present every request bypasses ACLs
    #[serde(default)]
    pub master_key: Option<SecretString>,

    /// REST API server, e.g. `https://xxxx.api.lncldglobal.com`
    pub server_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl LeanCloudConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.app_id.is_empty() {
            return Err("leancloud.app_id cannot be empty".to_string());
        }

        if self.app_key.expose_secret().is_empty() {
            return Err("leancloud.app_key cannot be empty".to_string());
        }

        if let Some(ref master_key) = self.master_key {
            if master_key.expose_secret().is_empty() {
                return Err("leancloud.master_key cannot be empty when set".to_string());
            }
        }

        validate_http_url("leancloud.server_url", &self.server_url)?;
        validate_timeout("leancloud.timeout_seconds", self.timeout_seconds)
    }
}

/// Deta Base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetaConfig {
    /// Project key; the part before the first `_` is the project ID
    /// Stored securely in memory and automatically zeroized on drop
    pub project_key: SecretString,

    /// Base API endpoint
    #[serde(default = "default_deta_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl DetaConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        let key = self.project_key.expose_secret();
        if key.is_empty() {
            return Err("deta.project_key cannot be empty".to_string());
        }

        if !key.as_str().contains('_') {
            return Err("deta.project_key must have the form '<project_id>_<secret>'".to_string());
        }

        validate_http_url("deta.endpoint", &self.endpoint)?;
        validate_timeout("deta.timeout_seconds", self.timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} cannot be empty"));
    }

    let parsed = url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "{field} must start with http:// or https://, got scheme '{scheme}'"
        )),
    }
}

fn validate_timeout(field: &str, seconds: u64) -> Result<(), String> {
    if seconds == 0 || seconds > 600 {
        return Err(format!("{field} must be between 1 and 600, got {seconds}"));
    }
    Ok(())
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_deta_endpoint() -> String {
    "https://database.deta.sh/v1".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
