//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for dittorm using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// dittorm - one CRUD surface over LeanCloud and Deta Base
#[derive(Parser, Debug)]
#[command(name = "dittorm")]
#[command(version, about, long_about = None)]
#[command(author = "dittorm Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "dittorm.toml", env = "DITTORM_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DITTORM_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print records matching a where expression
    Select(commands::query::SelectArgs),

    /// Print the number of records matching a where expression
    Count(commands::query::CountArgs),

    /// Insert one record
    Add(commands::write::AddArgs),

    /// Merge fields onto every matching record
    Update(commands::write::UpdateArgs),

    /// Delete every matching record
    Delete(commands::write::DeleteArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}

impl Cli {
    /// Run the selected command and return its exit code
    pub async fn execute(&self) -> anyhow::Result<i32> {
        match &self.command {
            Commands::Select(args) => args.execute(&self.config).await,
            Commands::Count(args) => args.execute(&self.config).await,
            Commands::Add(args) => args.execute(&self.config).await,
            Commands::Update(args) => args.execute(&self.config).await,
            Commands::Delete(args) => args.execute(&self.config).await,
            Commands::ValidateConfig(args) => args.execute(&self.config).await,
        }
    }
}
