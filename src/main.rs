// dittorm - Uniform CRUD models over LeanCloud and Deta Base
// Copyright (c) 2025 dittorm Contributors
// Licensed under the MIT License

use clap::Parser;
use dittorm::cli::Cli;
use dittorm::config::LoggingConfig;
use dittorm::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console-only logging on stderr; stdout carries the JSON output
    let log_level = cli.log_level.as_deref().unwrap_or("warn");
    let _guard = match init_logging(log_level, &LoggingConfig::default()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dittorm");

    let exit_code = match cli.execute().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    process::exit(exit_code);
}
