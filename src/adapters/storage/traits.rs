//! Storage abstraction traits
//!
//! This module defines the CRUD capability every storage adapter implements.
//! Records crossing this boundary always carry the primary-key alias, never
//! the backend's native key field.

use crate::domain::record::merge;
use crate::domain::{Access, Record, Result, SelectOptions, Where};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Change applied by [`Model::update`]
pub enum Update {
    /// Fields merged onto every matching record
    Merge(Record),

    /// Function computing the new fields from the existing record
    ///
    /// The function sees the record as callers do (primary-key alias in
    /// place) and its result is merged onto that record.
    With(Box<dyn Fn(&Record) -> Record + Send + Sync>),
}

impl Update {
    pub fn merge(data: Record) -> Self {
        Update::Merge(data)
    }

    pub fn with<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Record + Send + Sync + 'static,
    {
        Update::With(Box::new(f))
    }

    /// New version of `existing` after the change
    pub fn apply(&self, existing: &Record) -> Record {
        match self {
            Update::Merge(data) => merge(existing, data),
            Update::With(f) => merge(existing, &f(existing)),
        }
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Merge(data) => f.debug_tuple("Merge").field(data).finish(),
            Update::With(_) => f.write_str("With(<fn>)"),
        }
    }
}

/// Model bound to one backend connection and one table
///
/// Obtain one through [`crate::adapters::storage::factory`].
#[async_trait]
pub trait Model: Send + Sync {
    /// Table (class, base) this model is bound to
    fn table_name(&self) -> &str;

    /// Primary-key alias used in records and where expressions
    fn primary_key(&self) -> &str;

    /// Every record matching `filter`
    ///
    /// With `options.fields` set, each record is pruned to those fields plus
    /// the primary-key alias.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged, except that LeanCloud's "class
    /// does not exist" yields an empty list.
    async fn select(&self, filter: &Where, options: &SelectOptions) -> Result<Vec<Record>>;

    /// Number of records matching `filter`
    async fn count(&self, filter: &Where) -> Result<u64>;

    /// Insert one record and return it with its assigned primary key
    ///
    /// `access` only has an effect on backends with per-record ACLs.
    async fn add(&self, data: Record, access: Access) -> Result<Record>;

    /// Apply `update` to every record matching `filter`
    ///
    /// Not atomic: records are read first and written back concurrently.
    /// Returns the updated records.
    async fn update(&self, update: Update, filter: &Where) -> Result<Vec<Record>>;

    /// Delete every record matching `filter`
    ///
    /// Waits for every delete to settle; matching nothing is not an error.
    async fn delete(&self, filter: &Where) -> Result<()>;
}

/// Typed helpers over [`Model`]
///
/// # Examples
///
/// ```no_run
/// use dittorm::adapters::storage::{Model, ModelExt};
/// use dittorm::domain::{Access, SelectOptions, Where};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Comment {
///     #[serde(skip_serializing_if = "Option::is_none")]
///     id: Option<String>,
///     nick: String,
/// }
///
/// # async fn example(model: &dyn Model) -> dittorm::domain::Result<()> {
/// let saved: Comment = model
///     .add_as(&Comment { id: None, nick: "bob".into() }, Access::default())
///     .await?;
/// let found: Vec<Comment> = model
///     .select_as(&Where::new().eq("id", saved.id.clone()), &SelectOptions::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ModelExt: Model {
    async fn select_as<T>(&self, filter: &Where, options: &SelectOptions) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.select(filter, options)
            .await?
            .into_iter()
            .map(|record| Ok(serde_json::from_value(Value::Object(record))?))
            .collect()
    }

    async fn add_as<T>(&self, data: &T, access: Access) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let record = match serde_json::to_value(data)? {
            Value::Object(record) => record,
            other => {
                return Err(crate::domain::DittormError::Serialization(format!(
                    "record must serialize to a JSON object, got: {other}"
                )))
            }
        };
        let saved = self.add(record, access).await?;
        Ok(serde_json::from_value(Value::Object(saved))?)
    }
}

impl<M: Model + ?Sized> ModelExt for M {}
