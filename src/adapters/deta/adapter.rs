//! Deta Base model
//!
//! Implements [`Model`] over any [`DetaBaseApi`]. Every where expression is
//! compiled to a [`QueryPlan`] whose native requests run concurrently; their
//! results are concatenated in plan order.

use super::client::DetaBaseApi;
use super::keygen::{derive_key, next_jitter, now_millis};
use super::paging::fetch_window;
use super::query::{compile, matches, DetaCondition, DetaQuery, QueryPlan};
use crate::adapters::storage::{Model, Update};
use crate::domain::record::project;
use crate::domain::{Access, KeyMapping, Record, Result, SelectOptions, Where};
use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use serde_json::Value;
use std::sync::Arc;

/// Native identity field of Deta items
pub const KEY_FIELD: &str = "key";

/// Deta Base implementation of [`Model`]
pub struct DetaModel {
    table: String,
    keys: KeyMapping,
    base: Arc<dyn DetaBaseApi>,
}

impl DetaModel {
    /// Bind a model to `table`; an empty `primary_key` means `id`
    pub fn new(table: impl Into<String>, base: Arc<dyn DetaBaseApi>, primary_key: &str) -> Self {
        Self {
            table: table.into(),
            keys: KeyMapping::new(KEY_FIELD, primary_key),
            base,
        }
    }

    fn plan(&self, filter: &Where) -> QueryPlan {
        compile(&self.keys.to_native_where(filter), KEY_FIELD)
    }

    async fn lookup(&self, key: &str, residual: &DetaCondition) -> Result<Option<Record>> {
        Ok(self
            .base
            .get(key)
            .await?
            .filter(|item| matches(residual, item)))
    }

    /// Native items of one plan entry accepted by `plan`, windowed by
    /// `limit` and `offset`
    ///
    /// Local checks must run before the window is cut, so a plan with any
    /// of them fetches the entry in full and slices afterwards.
    async fn run(
        &self,
        plan: &QueryPlan,
        query: &DetaQuery,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Record>> {
        let items = match query {
            DetaQuery::Fetch { condition } if !plan.has_local_checks() => {
                return fetch_window(self.base.as_ref(), condition, limit, offset).await;
            }
            DetaQuery::Fetch { condition } => {
                fetch_window(self.base.as_ref(), condition, None, 0).await?
            }
            DetaQuery::Get { key, residual } => {
                self.lookup(key, residual).await?.into_iter().collect()
            }
        };

        let window = items
            .into_iter()
            .filter(|item| plan.accepts(item))
            .skip(offset);
        Ok(match limit {
            Some(limit) => window.take(limit).collect(),
            None => window.collect(),
        })
    }

    /// Native items matching `filter`, before key aliasing
    async fn find(&self, filter: &Where, limit: Option<usize>, offset: usize) -> Result<Vec<Record>> {
        let plan = self.plan(filter);
        let pages = try_join_all(
            plan.queries()
                .iter()
                .map(|query| self.run(&plan, query, limit, offset)),
        )
        .await?;

        Ok(pages.into_iter().flatten().collect())
    }

    /// Smallest key in the base, which is also the newest record's
    async fn current_min_key(&self) -> Result<Option<String>> {
        let page = self.base.fetch(&DetaCondition::new(), Some(1), None).await?;
        Ok(page
            .items
            .first()
            .and_then(|item| item.get(KEY_FIELD))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn write_back(&self, update: &Update, existing: Record) -> Result<Record> {
        let updated = update.apply(&existing);
        let Some(key) = self.keys.key_of(&existing) else {
            return Ok(updated);
        };

        let mut item = self.keys.strip(&updated);
        item.insert(KEY_FIELD.to_string(), Value::String(key));

        let saved = self.base.put(item).await?;
        Ok(self.keys.to_external(saved))
    }
}

#[async_trait]
impl Model for DetaModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn primary_key(&self) -> &str {
        self.keys.alias()
    }

    async fn select(&self, filter: &Where, options: &SelectOptions) -> Result<Vec<Record>> {
        if let Some(ref field) = options.desc {
            tracing::debug!(base = %self.table, field = %field, "Deta returns newest first, ignoring sort field");
        }

        let items = self
            .find(filter, options.limit, options.offset.unwrap_or(0))
            .await?;

        Ok(items
            .into_iter()
            .map(|item| self.keys.to_external(item))
            .map(|record| match options.fields {
                Some(ref fields) => project(record, fields, self.keys.alias()),
                None => record,
            })
            .collect())
    }

    async fn count(&self, filter: &Where) -> Result<u64> {
        let items = self.find(filter, None, 0).await?;
        Ok(items.len() as u64)
    }

    async fn add(&self, data: Record, _access: Access) -> Result<Record> {
        let current_min = self.current_min_key().await?;
        let key = derive_key(current_min.as_deref(), next_jitter(), now_millis());

        let mut item = self.keys.strip(&data);
        item.insert(KEY_FIELD.to_string(), Value::String(key.clone()));

        let saved = self.base.put(item).await?;
        tracing::debug!(base = %self.table, key = %key, "Created Deta item");
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

        tracing::debug!(base = %self.table, total = total, "Updated Deta items");
        results.into_iter().collect()
    }

    async fn delete(&self, filter: &Where) -> Result<()> {
        let options = SelectOptions::new().fields(Vec::<String>::new());
        let keys: Vec<String> = self
            .select(filter, &options)
            .await?
            .iter()
            .filter_map(|record| self.keys.key_of(record))
            .collect();

        if keys.is_empty() {
            return Ok(());
        }

        tracing::debug!(base = %self.table, count = keys.len(), "Deleting Deta items");
        join_all(keys.iter().map(|key| self.base.delete(key)))
            .await
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::deta::client::FetchPage;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Memory {
        items: Mutex<BTreeMap<String, Record>>,
    }

    #[async_trait]
    impl DetaBaseApi for Memory {
        fn name(&self) -> &str {
            "Memory"
        }

        async fn get(&self, key: &str) -> Result<Option<Record>> {
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        async fn fetch(
            &self,
            condition: &DetaCondition,
            limit: Option<usize>,
            last: Option<&str>,
        ) -> Result<FetchPage> {
            let items: Vec<Record> = self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| last.map_or(true, |last| k.as_str() > last))
                .filter(|(_, item)| matches(condition, item))
                .map(|(_, item)| item.clone())
                .collect();
            let size = limit.unwrap_or(usize::MAX);
            let last = (items.len() > size)
                .then(|| items[size - 1].get("key").and_then(Value::as_str).map(str::to_string))
                .flatten();
            Ok(FetchPage {
                items: items.into_iter().take(size).collect(),
                last,
            })
        }

        async fn put(&self, item: Record) -> Result<Record> {
            let key = item.get("key").and_then(Value::as_str).unwrap().to_string();
            self.items.lock().unwrap().insert(key, item.clone());
            Ok(item)
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.items.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_newer_records_get_smaller_keys() {
        let model = DetaModel::new("Comment", Arc::new(Memory::default()), "id");

        let first = model.add(record(json!({"n": 1})), Access::default()).await.unwrap();
        let second = model.add(record(json!({"n": 2})), Access::default()).await.unwrap();

        let first_key = first.get("id").and_then(Value::as_str).unwrap();
        let second_key = second.get("id").and_then(Value::as_str).unwrap();
        assert!(second_key <= first_key);
        assert!(first.get("key").is_none());

        let all = model.select(&Where::new(), &SelectOptions::default()).await.unwrap();
        assert_eq!(all[0].get("n"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_primary_key_equality_uses_lookup_with_residual() {
        let memory = Arc::new(Memory::default());
        memory
            .put(record(json!({"key": "k1", "status": "approved"})))
            .await
            .unwrap();
        let model = DetaModel::new("Comment", memory, "id");

        let hit = Where::new().eq("id", "k1").eq("status", "approved");
        let miss = Where::new().eq("id", "k1").eq("status", "spam");

        assert_eq!(model.count(&hit).await.unwrap(), 1);
        assert_eq!(model.count(&miss).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_key_and_delete_removes() {
        let memory = Arc::new(Memory::default());
        memory.put(record(json!({"key": "k1", "n": 5}))).await.unwrap();
        let model = DetaModel::new("Counter", memory.clone(), "id");

        let updated = model
            .update(
                Update::with(|r| {
                    let n = r.get("n").and_then(Value::as_i64).unwrap_or(0);
                    record(json!({"n": n + 1}))
                }),
                &Where::new().eq("id", "k1"),
            )
            .await
            .unwrap();

        assert_eq!(updated, vec![record(json!({"id": "k1", "n": 6}))]);
        assert_eq!(
            memory.get("k1").await.unwrap(),
            Some(record(json!({"key": "k1", "n": 6})))
        );

        model.delete(&Where::new().eq("n", 6)).await.unwrap();
        assert!(memory.items.lock().unwrap().is_empty());
    }
}
