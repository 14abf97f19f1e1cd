//! Model factory
//!
//! This module creates [`Model`] implementations for a selected storage
//! backend. Backend names are matched case-insensitively; an empty or unknown
//! name fails before any connection is attempted.

use crate::adapters::deta::{DetaClient, DetaModel};
use crate::adapters::leancloud::{LeanCloudClient, LeanCloudModel};
use crate::adapters::storage::traits::Model;
use crate::config::schema::{DittormConfig, StorageTarget};
use crate::domain::{DittormError, Result};
use std::sync::Arc;

/// Select a storage backend by name
///
/// # Errors
///
/// Returns [`DittormError::Configuration`] if `name` is empty or does not
/// name a supported backend.
///
/// # Examples
///
/// ```no_run
/// use dittorm::adapters::storage::dittorm;
/// use dittorm::config::load_config;
///
/// # async fn example() -> dittorm::domain::Result<()> {
/// let config = load_config("dittorm.toml")?;
/// let comments = dittorm("LeanCloud")?.model("Comment", &config)?;
/// println!("bound to {}", comments.table_name());
/// # Ok(())
/// # }
/// ```
pub fn dittorm(name: &str) -> Result<ModelFactory> {
    let target: StorageTarget = name.parse()?;
    Ok(ModelFactory::new(target))
}

/// Builds models for one storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelFactory {
    target: StorageTarget,
}

impl ModelFactory {
    pub fn new(target: StorageTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> StorageTarget {
        self.target
    }

    /// Bind a model to `table`
    ///
    /// The backend connection comes from the matching section of `config`.
    /// LeanCloud shares one process-wide client; Deta opens one base handle
    /// per model.
    ///
    /// # Errors
    ///
    /// Returns [`DittormError::Configuration`] if the backend's section is
    /// missing, or [`DittormError::Validation`] if `table` is empty.
    pub fn model(&self, table: &str, config: &DittormConfig) -> Result<Arc<dyn Model>> {
        if table.trim().is_empty() {
            return Err(DittormError::Validation(
                "table name cannot be empty".to_string(),
            ));
        }

        match self.target {
            StorageTarget::LeanCloud => {
                let leancloud = config.leancloud.as_ref().ok_or_else(|| {
                    DittormError::Configuration(
                        "leancloud configuration is required for the leancloud storage"
                            .to_string(),
                    )
                })?;

                tracing::info!(table = %table, "Creating LeanCloud model");
                let client = LeanCloudClient::shared(leancloud)?;
                let model = LeanCloudModel::new(table, client, &config.primary_key);

                Ok(Arc::new(model) as Arc<dyn Model>)
            }
            StorageTarget::Deta => {
                let deta = config.deta.as_ref().ok_or_else(|| {
                    DittormError::Configuration(
                        "deta configuration is required for the deta storage".to_string(),
                    )
                })?;

                tracing::info!(table = %table, "Creating Deta model");
                let base = DetaClient::connect(deta)?.base(table);
                let model = DetaModel::new(table, Arc::new(base), &config.primary_key);

                Ok(Arc::new(model) as Arc<dyn Model>)
            }
        }
    }
}

/// Create a model for `table` on the backend selected by `config.storage`
pub fn create_model(config: &DittormConfig, table: &str) -> Result<Arc<dyn Model>> {
    ModelFactory::new(config.storage).model(table, config)
}
