//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DittormConfig, StorageTarget};
use super::secret::secret_string;
use crate::domain::errors::DittormError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DittormConfig
/// 4. Applies environment variable overrides (DITTORM_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`DittormError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, the TOML does not parse, or
/// validation fails.
///
/// # Examples
///
/// ```no_run
/// use dittorm::config::loader::load_config;
///
/// let config = load_config("dittorm.toml").expect("Failed to load config");
/// println!("storage: {}", config.storage);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DittormConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DittormError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        DittormError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: DittormConfig = toml::from_str(&contents)
        .map_err(|e| DittormError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        DittormError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. All missing variables are reported in
/// one error.
pub(crate) fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| DittormError::Configuration(e.to_string()))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&cap[0], &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(DittormError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the DITTORM_* prefix
///
/// Environment variables follow the pattern `DITTORM_<SECTION>_<KEY>`, e.g.
/// `DITTORM_LEANCLOUD_SERVER_URL` or `DITTORM_DETA_PROJECT_KEY`. Backend
/// overrides only apply to sections present in the file.
fn apply_env_overrides(config: &mut DittormConfig) -> Result<()> {
    if let Ok(val) = std::env::var("DITTORM_STORAGE") {
        config.storage = val.parse::<StorageTarget>()?;
    }
    if let Ok(val) = std::env::var("DITTORM_PRIMARY_KEY") {
        config.primary_key = val;
    }

    if let Ok(val) = std::env::var("DITTORM_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Some(ref mut leancloud) = config.leancloud {
        if let Ok(val) = std::env::var("DITTORM_LEANCLOUD_APP_ID") {
            leancloud.app_id = val;
        }
        if let Ok(val) = std::env::var("DITTORM_LEANCLOUD_APP_KEY") {
            leancloud.app_key = secret_string(val);
        }
        if let Ok(val) = std::env::var("DITTORM_LEANCLOUD_MASTER_KEY") {
            leancloud.master_key = Some(secret_string(val));
        }
        if let Ok(val) = std::env::var("DITTORM_LEANCLOUD_SERVER_URL") {
            leancloud.server_url = val;
        }
        if let Ok(val) = std::env::var("DITTORM_LEANCLOUD_TIMEOUT_SECONDS") {
            if let Ok(seconds) = val.parse() {
                leancloud.timeout_seconds = seconds;
            }
        }
    }

    if let Some(ref mut deta) = config.deta {
        if let Ok(val) = std::env::var("DITTORM_DETA_PROJECT_KEY") {
            deta.project_key = secret_string(val);
        }
        if let Ok(val) = std::env::var("DITTORM_DETA_ENDPOINT") {
            deta.endpoint = val;
        }
        if let Ok(val) = std::env::var("DITTORM_DETA_TIMEOUT_SECONDS") {
            if let Ok(seconds) = val.parse() {
                deta.timeout_seconds = seconds;
            }
        }
    }

    if let Ok(val) = std::env::var("DITTORM_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("DITTORM_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("DITTORM_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
