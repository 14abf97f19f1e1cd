// dittorm - Uniform CRUD models over LeanCloud and Deta Base
// Copyright (c) 2025 dittorm Contributors
// Licensed under the MIT License

//! # dittorm - one CRUD surface over LeanCloud and Deta Base
//!
//! dittorm lets a caller pick a storage backend by name and get a model with
//! the same `select`, `count`, `add`, `update` and `delete` operations
//! whichever service executes them.
//!
//! ## Overview
//!
//! - **Where expressions** describe filters once: equality, `IN`, `NOT IN`,
//!   `LIKE`, `!=`, `>` and a nested `_complex` boolean combination
//! - **Condition compilers** turn them into LeanCloud `where` JSON or into a
//!   Deta Base query plan (Cartesian `IN` expansion, point lookups)
//! - **Paging strategies** read complete result sets: 100-object pages on
//!   LeanCloud, cursor replay on Deta Base
//! - **Primary-key aliasing** hides `objectId` / `key` behind one configured
//!   field name
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`adapters`] - Storage backends and the [`adapters::storage::Model`] trait
//! - [`domain`] - Where expressions, records, options and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dittorm::adapters::storage::dittorm;
//! use dittorm::config::load_config;
//! use dittorm::domain::{Access, Record, SelectOptions, Where};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("dittorm.toml")?;
//!     let comments = dittorm("leancloud")?.model("Comment", &config)?;
//!
//!     let mut data = Record::new();
//!     data.insert("nick".into(), "bob".into());
//!     let saved = comments.add(data, Access::default()).await?;
//!
//!     let found = comments
//!         .select(&Where::new().eq("id", saved["id"].clone()), &SelectOptions::new())
//!         .await?;
//!     println!("found {}", found.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Where expressions in JSON
//!
//! The JSON form accepted by [`domain::Where::from_json`] and the CLI:
//!
//! ```rust
//! use dittorm::domain::{Filter, Where};
//!
//! let filter: Where = r#"{
//!     "status": "approved",
//!     "url": ["IN", ["/a", "/b"]],
//!     "nick": ["LIKE", "%bob%"],
//!     "_complex": {"_logic": "or", "pid": null, "rid": ""}
//! }"#
//! .parse()
//! .unwrap();
//!
//! assert_eq!(filter.get("status"), Some(&Filter::Eq("approved".into())));
//! assert!(filter.complex().is_some());
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`] with a
//! [`domain::DittormError`]. Backend failures keep the service's status or
//! code and message; LeanCloud's "class does not exist" reads as empty.
//!
//! ## Logging
//!
//! Libraries log through `tracing`; binaries call
//! [`logging::init_logging`]. Filters a backend cannot apply are dropped with
//! a warning rather than an error.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;

pub use adapters::storage::{create_model, dittorm, Model, ModelExt, ModelFactory, Update};
pub use domain::{Access, DittormError, Record, Result, SelectOptions, Where};
