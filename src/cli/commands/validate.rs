//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the dittorm configuration file.

use crate::config::load_config;
use crate::config::schema::StorageTarget;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Storage: {}", config.storage);
        println!("  Primary Key: {}", config.primary_key);
        println!("  Log Level: {}", config.application.log_level);

        match config.storage {
            StorageTarget::LeanCloud => {
                if let Some(ref lc) = config.leancloud {
                    println!("  LeanCloud Server: {}", lc.server_url);
                    println!("  LeanCloud App ID: {}", lc.app_id);
                    println!(
                        "  Master Key: {}",
                        if lc.master_key.is_some() { "set" } else { "not set" }
                    );
                }
            }
            StorageTarget::Deta => {
                if let Some(ref deta) = config.deta {
                    println!("  Deta Endpoint: {}", deta.endpoint);
                }
            }
        }

        if config.logging.local_enabled {
            println!(
                "  Log File: {}/dittorm.log ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();
        Ok(0)
    }
}
