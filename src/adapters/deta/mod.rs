//! Deta Base key-value adapter
//!
//! - [`query`] - where-expression to query-plan compiler and matcher
//! - [`client`] - Base HTTP client
//! - [`paging`] - offset/limit windows over cursor paging
//! - [`keygen`] - descending key generator
//! - [`adapter`] - [`DetaModel`], the [`crate::adapters::storage::Model`] implementation

pub mod adapter;
pub mod client;
pub mod keygen;
pub mod paging;
pub mod query;

pub use adapter::{DetaModel, KEY_FIELD};
pub use client::{DetaBase, DetaBaseApi, DetaClient, FetchPage};
pub use paging::fetch_window;
pub use query::{compile, matches, DetaCondition, DetaQuery, QueryPlan};
