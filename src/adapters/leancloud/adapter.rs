//! LeanCloud model
//!
//! Implements [`Model`] over any [`LeanCloudApi`]. Records leave this module
//! with `objectId` renamed to the configured primary-key alias.

use super::client::{FindOptions, LeanCloudApi, PAGE_SIZE};
use super::query::{compile, LeanQuery};
use crate::adapters::storage::{Model, Update};
use crate::domain::record::{merge, project};
use crate::domain::{Access, KeyMapping, Record, Result, SelectOptions, Where};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Native identity field of LeanCloud objects
pub const OBJECT_ID: &str = "objectId";

/// Fields maintained by the service that are never written back
const SERVER_FIELDS: [&str; 3] = ["createdAt", "updatedAt", "ACL"];

/// LeanCloud implementation of [`Model`]
pub struct LeanCloudModel {
    table: String,
    keys: KeyMapping,
    api: Arc<dyn LeanCloudApi>,
}

impl LeanCloudModel {
    /// Bind a model to `table`; an empty `primary_key` means `id`
    pub fn new(table: impl Into<String>, api: Arc<dyn LeanCloudApi>, primary_key: &str) -> Self {
        Self {
            table: table.into(),
            keys: KeyMapping::new(OBJECT_ID, primary_key),
            api,
        }
    }

    fn query(&self, filter: &Where) -> LeanQuery {
        compile(&self.table, &self.keys.to_native_where(filter))
    }

    /// Page through `query` 100 objects at a time, starting at `offset`
    ///
    /// Stops on a short page or once `limit` objects are gathered. A missing
    /// class reads as empty.
    async fn find_all(&self, query: &LeanQuery, options: &SelectOptions) -> Result<Vec<Record>> {
        let keys = options.fields.as_ref().map(|fields| {
            let mut keys: Vec<String> = fields
                .iter()
                .map(|f| self.keys.to_native_field(f).to_string())
                .collect();
            if !keys.iter().any(|k| k == OBJECT_ID) {
                keys.push(OBJECT_ID.to_string());
            }
            keys
        });

        let mut records = Vec::new();
        let mut skip = options.offset.unwrap_or(0);

        loop {
            let page_size = match options.limit {
                Some(limit) => limit.saturating_sub(records.len()).min(PAGE_SIZE),
                None => PAGE_SIZE,
            };
            if page_size == 0 {
                break;
            }

            let find = FindOptions {
                limit: Some(page_size),
                skip: (skip > 0).then_some(skip),
                descending: options.desc.clone(),
                keys: keys.clone(),
            };

            let page = match self.api.find(query, &find).await {
                Ok(page) => page,
                Err(e) if e.is_missing_collection() => {
                    tracing::warn!(class = %self.table, "LeanCloud class does not exist, reading as empty");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };

            let received = page.len();
            skip += received;
            records.extend(page);

            tracing::debug!(
                class = %self.table,
                received = received,
                total = records.len(),
                "Fetched LeanCloud page"
            );

            if received < page_size {
                break;
            }
        }

        Ok(records)
    }

    /// Fields of `updated` that differ from `existing` and may be written
    fn changed_fields(&self, existing: &Record, updated: &Record) -> Record {
        updated
            .iter()
            .filter(|(k, _)| {
                let k = k.as_str();
                !SERVER_FIELDS.contains(&k) && k != self.keys.alias() && k != OBJECT_ID
            })
            .filter(|(k, v)| existing.get(k.as_str()) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    async fn write_back(&self, update: &Update, existing: Record) -> Result<Record> {
        let updated = update.apply(&existing);
        let Some(object_id) = self.keys.key_of(&existing) else {
            return Ok(updated);
        };

        let changes = self.changed_fields(&existing, &updated);
        if changes.is_empty() {
            return Ok(updated);
        }

        let saved = self.api.update(&self.table, &object_id, &changes).await?;
        Ok(self.keys.to_external(merge(&updated, &saved)))
    }
}

/// ACL granting public read and/or write
fn acl(access: Access) -> Value {
    let mut public = Map::new();
    if access.read {
        public.insert("read".to_string(), Value::Bool(true));
    }
    if access.write {
        public.insert("write".to_string(), Value::Bool(true));
    }
    json!({ "*": public })
}

#[async_trait]
impl Model for LeanCloudModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn primary_key(&self) -> &str {
        self.keys.alias()
    }

    async fn select(&self, filter: &Where, options: &SelectOptions) -> Result<Vec<Record>> {
        let query = self.query(filter);
        let records = self.find_all(&query, options).await?;

        Ok(records
            .into_iter()
            .map(|record| self.keys.to_external(record))
            .map(|record| match options.fields {
                Some(ref fields) => project(record, fields, self.keys.alias()),
                None => record,
            })
            .collect())
    }

    async fn count(&self, filter: &Where) -> Result<u64> {
        match self.api.count(&self.query(filter)).await {
            Ok(count) => Ok(count),
            Err(e) if e.is_missing_collection() => Ok(0),
            Err(e) => Err(e),
        }
    }

    async fn add(&self, data: Record, access: Access) -> Result<Record> {
        let data = self.keys.strip(&data);
        let saved = self.api.create(&self.table, &data, &acl(access)).await?;

        tracing::debug!(class = %self.table, "Created LeanCloud object");
        Ok(self.keys.to_external(saved))
    }

    async fn update(&self, update: Update, filter: &Where) -> Result<Vec<Record>> {
        let existing = self.select(filter, &SelectOptions::default()).await?;
        let total = existing.len();

        let results = join_all(
            existing
                .into_iter()
                .map(|record| self.write_back(&update, record)),
        )
        .await;

        tracing::debug!(class = %self.table, total = total, "Updated LeanCloud objects");
        results.into_iter().collect()
    }

    async fn delete(&self, filter: &Where) -> Result<()> {
        let options = SelectOptions::new().fields(Vec::<String>::new());
        let ids: Vec<String> = self
            .select(filter, &options)
            .await?
            .iter()
            .filter_map(|record| self.keys.key_of(record))
            .collect();

        if ids.is_empty() {
            return Ok(());
        }

        tracing::debug!(class = %self.table, count = ids.len(), "Deleting LeanCloud objects");
        self.api.destroy_all(&self.table, &ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_from_access() {
        assert_eq!(
            acl(Access::default()),
            json!({"*": {"read": true, "write": true}})
        );
        assert_eq!(
            acl(Access {
                read: true,
                write: false
            }),
            json!({"*": {"read": true}})
        );
    }
}
