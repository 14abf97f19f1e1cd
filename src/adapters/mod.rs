//! Storage backends behind one CRUD surface.
//!
//! - [`storage`] - the [`storage::Model`] trait and the factory that picks a backend
//! - [`leancloud`] - LeanCloud document service
//! - [`deta`] - Deta Base key-value service
//!
//! # Design Pattern
//!
//! Each backend is split into a query compiler, an HTTP client behind a
//! trait (so tests can substitute an in-memory store) and a model that
//! implements [`storage::Model`] on top of both.
//!
//! ```rust,no_run
//! use dittorm::adapters::storage::{dittorm, Model};
//! use dittorm::config::load_config;
//! use dittorm::domain::{SelectOptions, Where};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("dittorm.toml")?;
//! let comments = dittorm(config.storage.as_str())?.model("Comment", &config)?;
//!
//! let approved = comments
//!     .select(
//!         &Where::new().eq("status", "approved"),
//!         &SelectOptions::new().limit(10).desc("insertedAt"),
//!     )
//!     .await?;
//! println!("{} comments", approved.len());
//! # Ok(())
//! # }
//! ```

pub mod deta;
pub mod leancloud;
pub mod storage;
