//! In-memory backends for driving the models without a network
//!
//! `MemoryLeanCloud` evaluates LeanCloud `where` JSON itself; `MemoryDeta`
//! keeps items in key order and reuses the crate's own condition matcher.

#![allow(dead_code)]

use async_trait::async_trait;
use dittorm::adapters::deta::{matches, DetaBaseApi, DetaCondition, FetchPage};
use dittorm::adapters::leancloud::{FindOptions, LeanCloudApi, LeanQuery, OBJECT_ID};
use dittorm::domain::record::merge;
use dittorm::domain::{LeanCloudError, Record, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

pub fn record(value: Value) -> Record {
    value
        .as_object()
        .cloned()
        .expect("test records are JSON objects")
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// LeanCloud store keeping objects in insertion order
#[derive(Default)]
pub struct MemoryLeanCloud {
    pub objects: Mutex<Vec<Record>>,
    pub acls: Mutex<Vec<Value>>,
    pub finds: Mutex<Vec<FindOptions>>,
    pub updates: AtomicUsize,
    next_id: AtomicUsize,
    missing_class: bool,
}

impl MemoryLeanCloud {
    /// A store whose class does not exist yet (error 101 on reads)
    pub fn missing_class() -> Self {
        Self {
            missing_class: true,
            ..Self::default()
        }
    }

    /// Insert objects directly, assigning sequential object IDs
    pub fn seed(&self, records: impl IntoIterator<Item = Record>) {
        let mut objects = self.objects.lock().unwrap();
        for mut record in records {
            let id = self.next_object_id();
            record.insert(OBJECT_ID.to_string(), Value::String(id));
            objects.push(record);
        }
    }

    fn next_object_id(&self) -> String {
        format!("obj{:05}", self.next_id.fetch_add(1, AtomicOrdering::SeqCst))
    }

    fn check_class(&self) -> Result<()> {
        if self.missing_class {
            return Err(LeanCloudError::Api {
                code: 101,
                message: "Class or object doesn't exists.".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn matching(&self, query: &LeanQuery) -> Vec<Record> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .filter(|object| evaluate(query.condition(), object))
            .cloned()
            .collect()
    }
}

/// Whether `object` satisfies a LeanCloud `where` object
pub fn evaluate(condition: &Map<String, Value>, object: &Record) -> bool {
    condition.iter().all(|(key, expected)| match key.as_str() {
        "$and" => subqueries(expected).iter().all(|q| evaluate(q, object)),
        "$or" => subqueries(expected).iter().any(|q| evaluate(q, object)),
        "$nor" => !subqueries(expected).iter().any(|q| evaluate(q, object)),
        field => {
            let actual = object.get(field);
            match expected {
                Value::Object(ops) if ops.keys().all(|op| op.starts_with('$')) => ops
                    .iter()
                    .all(|(op, operand)| apply_operator(op, operand, actual)),
                _ => actual == Some(expected),
            }
        }
    })
}

fn subqueries(value: &Value) -> Vec<Map<String, Value>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(|v| v.as_object().cloned()).collect())
        .unwrap_or_default()
}

fn apply_operator(op: &str, operand: &Value, actual: Option<&Value>) -> bool {
    match op {
        "$in" => operand
            .as_array()
            .is_some_and(|values| actual.is_some_and(|a| values.contains(a))),
        "$nin" => operand
            .as_array()
            .map_or(true, |values| !actual.is_some_and(|a| values.contains(a))),
        "$ne" => actual != Some(operand),
        "$gt" => actual.is_some_and(|a| compare(a, operand) == Some(Ordering::Greater)),
        "$exists" => actual.is_some() == operand.as_bool().unwrap_or(true),
        "$regex" => {
            let pattern = operand.as_str().unwrap_or_default();
            let re = Regex::new(pattern).expect("compiled patterns are valid");
            actual.and_then(Value::as_str).is_some_and(|a| re.is_match(a))
        }
        _ => true,
    }
}

#[async_trait]
impl LeanCloudApi for MemoryLeanCloud {
    async fn find(&self, query: &LeanQuery, options: &FindOptions) -> Result<Vec<Record>> {
        self.check_class()?;
        self.finds.lock().unwrap().push(options.clone());

        let mut objects = self.matching(query);
        if let Some(ref field) = options.descending {
            objects.sort_by(|a, b| {
                match (a.get(field), b.get(field)) {
                    (Some(a), Some(b)) => compare(b, a).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                }
            });
        }

        let page = objects
            .into_iter()
            .skip(options.skip.unwrap_or(0))
            .take(options.limit.unwrap_or(100));

        Ok(match options.keys {
            Some(ref keys) => page
                .map(|object| {
                    object
                        .into_iter()
                        .filter(|(k, _)| keys.contains(k))
                        .collect()
                })
                .collect(),
            None => page.collect(),
        })
    }

    async fn count(&self, query: &LeanQuery) -> Result<u64> {
        self.check_class()?;
        Ok(self.matching(query).len() as u64)
    }

    async fn create(&self, _class_name: &str, data: &Record, acl: &Value) -> Result<Record> {
        let mut object = data.clone();
        object.insert(
            OBJECT_ID.to_string(),
            Value::String(self.next_object_id()),
        );
        self.objects.lock().unwrap().push(object.clone());
        self.acls.lock().unwrap().push(acl.clone());
        Ok(object)
    }

    async fn update(&self, _class_name: &str, object_id: &str, data: &Record) -> Result<Record> {
        self.updates.fetch_add(1, AtomicOrdering::SeqCst);
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .iter_mut()
            .find(|o| o.get(OBJECT_ID).and_then(Value::as_str) == Some(object_id))
            .ok_or_else(|| LeanCloudError::Api {
                code: 101,
                message: "Object not found.".to_string(),
            })?;
        *object = merge(object, data);
        Ok(object.clone())
    }

    async fn destroy_all(&self, _class_name: &str, object_ids: &[String]) -> Result<()> {
        self.objects.lock().unwrap().retain(|o| {
            !o.get(OBJECT_ID)
                .and_then(Value::as_str)
                .is_some_and(|id| object_ids.iter().any(|d| d == id))
        });
        Ok(())
    }
}

/// Deta base keeping items in ascending key order
#[derive(Default)]
pub struct MemoryDeta {
    pub items: Mutex<BTreeMap<String, Record>>,
    pub fetches: Mutex<Vec<DetaCondition>>,
    pub gets: AtomicUsize,
}

impl MemoryDeta {
    /// Items are stored under their `key` field
    pub fn seed(&self, records: impl IntoIterator<Item = Record>) {
        let mut items = self.items.lock().unwrap();
        for record in records {
            let key = record
                .get("key")
                .and_then(Value::as_str)
                .expect("seeded items carry a key")
                .to_string();
            items.insert(key, record);
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl DetaBaseApi for MemoryDeta {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Record>> {
        self.gets.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    async fn fetch(
        &self,
        condition: &DetaCondition,
        limit: Option<usize>,
        last: Option<&str>,
    ) -> Result<FetchPage> {
        self.fetches.lock().unwrap().push(condition.clone());

        let matched: Vec<Record> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| last.map_or(true, |last| k.as_str() > last))
            .filter(|(_, item)| matches(condition, item))
            .map(|(_, item)| item.clone())
            .collect();

        let size = limit.unwrap_or(1000);
        let last = if matched.len() > size {
            matched[size - 1]
                .get("key")
                .and_then(Value::as_str)
                .map(str::to_string)
        } else {
            None
        };

        Ok(FetchPage {
            items: matched.into_iter().take(size).collect(),
            last,
        })
    }

    async fn put(&self, item: Record) -> Result<Record> {
        let key = item
            .get("key")
            .and_then(Value::as_str)
            .expect("put items carry a key")
            .to_string();
        self.items.lock().unwrap().insert(key, item.clone());
        Ok(item)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }
}
