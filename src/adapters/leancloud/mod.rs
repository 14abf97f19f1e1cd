//! LeanCloud document-service adapter
//!
//! - [`query`] - native query builder and where-expression compiler
//! - [`client`] - REST client and the process-wide shared instance
//! - [`adapter`] - [`LeanCloudModel`], the [`crate::adapters::storage::Model`] implementation

pub mod adapter;
pub mod client;
pub mod query;

pub use adapter::{LeanCloudModel, OBJECT_ID};
pub use client::{FindOptions, LeanCloudApi, LeanCloudClient, PAGE_SIZE};
pub use query::{compile, LeanQuery};
