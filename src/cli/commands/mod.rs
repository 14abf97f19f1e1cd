//! CLI command implementations
//!
//! Every command loads the configuration, binds a model to the requested
//! table and prints the outcome as pretty JSON on stdout. Failures are
//! reported on stderr and mapped to exit codes:
//!
//! - `2` configuration or argument error
//! - `4` backend or connection error
//! - `5` anything else

pub mod query;
pub mod validate;
pub mod write;

use crate::adapters::storage::{create_model, Model};
use crate::config::load_config;
use crate::domain::{DittormError, Record, Result};
use serde::Serialize;
use std::sync::Arc;

/// Exit code for a failed operation
pub fn exit_code(error: &DittormError) -> i32 {
    match error {
        DittormError::Configuration(_)
        | DittormError::Validation(_)
        | DittormError::InvalidCondition(_)
        | DittormError::Serialization(_) => 2,
        DittormError::LeanCloud(_) | DittormError::Deta(_) => 4,
        DittormError::Io(_) | DittormError::Other(_) => 5,
    }
}

/// Load the configuration and bind a model to `table`
pub(crate) fn open_model(config_path: &str, table: &str) -> Result<Arc<dyn Model>> {
    let config = load_config(config_path)?;
    create_model(&config, table)
}

/// Parse a JSON object argument
pub(crate) fn parse_record(raw: &str) -> Result<Record> {
    serde_json::from_str(raw)
        .map_err(|e| DittormError::Validation(format!("expected a JSON object: {e}")))
}

/// Print `value` as pretty JSON and return the exit code
pub(crate) fn emit<T: Serialize>(value: &T) -> anyhow::Result<i32> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(0)
}

/// Report `error` and return its exit code
pub(crate) fn fail(context: &str, error: DittormError) -> anyhow::Result<i32> {
    crate::log_error_with_context!(&error, context);
    eprintln!("❌ {context}");
    eprintln!("   Error: {error}");
    Ok(exit_code(&error))
}
