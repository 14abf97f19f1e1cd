//! Read commands
//!
//! `select` and `count` against one table.

use super::{emit, fail, open_model};
use crate::domain::{SelectOptions, Where};
use clap::Args;
use serde_json::json;

/// Arguments for the select command
#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Table (class, base) to read
    pub table: String,

    /// Where expression as JSON, e.g. '{"status": "approved"}'
    #[arg(short = 'w', long = "where", default_value = "{}")]
    pub filter: String,

    /// Maximum number of records
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of records to skip
    #[arg(long)]
    pub offset: Option<usize>,

    /// Sort descending by this field
    #[arg(long)]
    pub desc: Option<String>,

    /// Comma-separated projection; the primary key is always kept
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,
}

impl SelectArgs {
    pub fn options(&self) -> SelectOptions {
        SelectOptions {
            limit: self.limit,
            offset: self.offset,
            desc: self.desc.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Execute the select command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(table = %self.table, "Selecting records");

        let filter: Where = match self.filter.parse() {
            Ok(f) => f,
            Err(e) => return fail("Invalid --where expression", e),
        };
        let model = match open_model(config_path, &self.table) {
            Ok(m) => m,
            Err(e) => return fail("Failed to open model", e),
        };

        match model.select(&filter, &self.options()).await {
            Ok(records) => emit(&records),
            Err(e) => fail("Select failed", e),
        }
    }
}

/// Arguments for the count command
#[derive(Args, Debug)]
pub struct CountArgs {
    /// Table (class, base) to count
    pub table: String,

    /// Where expression as JSON
    #[arg(short = 'w', long = "where", default_value = "{}")]
    pub filter: String,
}

impl CountArgs {
    /// Execute the count command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(table = %self.table, "Counting records");

        let filter: Where = match self.filter.parse() {
            Ok(f) => f,
            Err(e) => return fail("Invalid --where expression", e),
        };
        let model = match open_model(config_path, &self.table) {
            Ok(m) => m,
            Err(e) => return fail("Failed to open model", e),
        };

        match model.count(&filter).await {
            Ok(count) => emit(&json!({ "count": count })),
            Err(e) => fail("Count failed", e),
        }
    }
}
