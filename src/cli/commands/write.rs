//! Write commands
//!
//! `add`, `update` and `delete` against one table. Record data is passed as a
//! JSON object.

use super::{emit, fail, open_model, parse_record};
use crate::adapters::storage::Update;
use crate::domain::{Access, Where};
use clap::Args;
use serde_json::json;

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Table (class, base) to insert into
    pub table: String,

    /// Record as a JSON object
    #[arg(short, long)]
    pub data: String,

    /// Do not grant public read access (LeanCloud only)
    #[arg(long)]
    pub private_read: bool,

    /// Do not grant public write access (LeanCloud only)
    #[arg(long)]
    pub private_write: bool,
}

impl AddArgs {
    pub fn access(&self) -> Access {
        Access {
            read: !self.private_read,
            write: !self.private_write,
        }
    }

    /// Execute the add command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(table = %self.table, "Adding record");

        let data = match parse_record(&self.data) {
            Ok(d) => d,
            Err(e) => return fail("Invalid --data", e),
        };
        let model = match open_model(config_path, &self.table) {
            Ok(m) => m,
            Err(e) => return fail("Failed to open model", e),
        };

        match model.add(data, self.access()).await {
            Ok(record) => emit(&record),
            Err(e) => fail("Add failed", e),
        }
    }
}

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Table (class, base) to update
    pub table: String,

    /// Fields merged onto every matching record, as a JSON object
    #[arg(short, long)]
    pub data: String,

    /// Where expression as JSON
    #[arg(short = 'w', long = "where", default_value = "{}")]
    pub filter: String,
}

impl UpdateArgs {
    /// Execute the update command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(table = %self.table, "Updating records");

        let data = match parse_record(&self.data) {
            Ok(d) => d,
            Err(e) => return fail("Invalid --data", e),
        };
        let filter: Where = match self.filter.parse() {
            Ok(f) => f,
            Err(e) => return fail("Invalid --where expression", e),
        };
        let model = match open_model(config_path, &self.table) {
            Ok(m) => m,
            Err(e) => return fail("Failed to open model", e),
        };

        match model.update(Update::merge(data), &filter).await {
            Ok(records) => emit(&records),
            Err(e) => fail("Update failed", e),
        }
    }
}

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Table (class, base) to delete from
    pub table: String,

    /// Where expression as JSON
    #[arg(short = 'w', long = "where")]
    pub filter: String,
}

impl DeleteArgs {
    /// Execute the delete command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(table = %self.table, "Deleting records");

        let filter: Where = match self.filter.parse() {
            Ok(f) => f,
            Err(e) => return fail("Invalid --where expression", e),
        };
        let model = match open_model(config_path, &self.table) {
            Ok(m) => m,
            Err(e) => return fail("Failed to open model", e),
        };

        match model.delete(&filter).await {
            Ok(()) => emit(&json!({ "deleted": true })),
            Err(e) => fail("Delete failed", e),
        }
    }
}
