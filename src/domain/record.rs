//! Records and the primary-key boundary
//!
//! Every backend names its identity field differently (`objectId` for
//! LeanCloud, `key` for Deta Base). Callers only ever see the configured alias.
//! [`KeyMapping`] is the single place where records and where expressions are
//! translated between the two names.

use crate::domain::condition::Where;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A stored record as a JSON object
pub type Record = Map<String, Value>;

/// Primary-key alias used when none is configured
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Translation between a backend's native key field and the caller's alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMapping {
    native: &'static str,
    alias: String,
}

impl KeyMapping {
    /// An empty alias falls back to [`DEFAULT_PRIMARY_KEY`]
    pub fn new(native: &'static str, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        let alias = if alias.trim().is_empty() {
            DEFAULT_PRIMARY_KEY.to_string()
        } else {
            alias
        };
        Self { native, alias }
    }

    pub fn native(&self) -> &str {
        self.native
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Rewrite alias references in a where expression to the native field
    pub fn to_native_where(&self, filter: &Where) -> Where {
        filter.rename_field(&self.alias, self.native)
    }

    pub fn to_native_field<'a>(&'a self, field: &'a str) -> &'a str {
        if field == self.alias {
            self.native
        } else {
            field
        }
    }

    /// Rename the native key field of a backend record to the alias
    pub fn to_external(&self, mut record: Record) -> Record {
        if self.alias == self.native {
            return record;
        }
        if let Some(key) = record.remove(self.native) {
            record.insert(self.alias.clone(), key);
        }
        record
    }

    /// Key of an external record, as a string
    pub fn key_of(&self, record: &Record) -> Option<String> {
        match record.get(&self.alias)? {
            Value::String(key) => Some(key.clone()),
            Value::Number(key) => Some(key.to_string()),
            _ => None,
        }
    }

    /// Copy of a record without either key field, for write payloads
    pub fn strip(&self, record: &Record) -> Record {
        record
            .iter()
            .filter(|(k, _)| k.as_str() != self.alias && k.as_str() != self.native)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Prune a record to `fields` plus the `keep` field
pub fn project(record: Record, fields: &[String], keep: &str) -> Record {
    let allowed: HashSet<&str> = fields
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(keep))
        .collect();
    record
        .into_iter()
        .filter(|(k, _)| allowed.contains(k.as_str()))
        .collect()
}

/// Shallow merge of `changes` onto `base`
pub fn merge(base: &Record, changes: &Record) -> Record {
    let mut merged = base.clone();
    for (k, v) in changes {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::condition::Filter;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_alias_falls_back_to_id() {
        let mapping = KeyMapping::new("objectId", "");
        assert_eq!(mapping.alias(), "id");
    }

    #[test]
    fn test_to_external_renames_native_key() {
        let mapping = KeyMapping::new("key", "id");
        let out = mapping.to_external(record(json!({"key": "42", "nick": "bob"})));
        assert_eq!(out, record(json!({"id": "42", "nick": "bob"})));
    }

    #[test]
    fn test_to_external_identity_when_alias_is_native() {
        let mapping = KeyMapping::new("key", "key");
        let input = record(json!({"key": "42"}));
        assert_eq!(mapping.to_external(input.clone()), input);
    }

    #[test]
    fn test_to_native_where_and_field() {
        let mapping = KeyMapping::new("objectId", "uid");
        let native = mapping.to_native_where(&Where::new().eq("uid", "abc"));
        assert_eq!(native.get("objectId"), Some(&Filter::Eq(json!("abc"))));
        assert_eq!(mapping.to_native_field("uid"), "objectId");
        assert_eq!(mapping.to_native_field("nick"), "nick");
    }

    #[test]
    fn test_key_of_accepts_numbers() {
        let mapping = KeyMapping::new("key", "id");
        assert_eq!(mapping.key_of(&record(json!({"id": 7}))), Some("7".to_string()));
        assert_eq!(mapping.key_of(&record(json!({"nick": "x"}))), None);
    }

    #[test]
    fn test_strip_removes_both_key_fields() {
        let mapping = KeyMapping::new("objectId", "id");
        let out = mapping.strip(&record(json!({"id": "a", "objectId": "a", "n": 1})));
        assert_eq!(out, record(json!({"n": 1})));
    }

    #[test]
    fn test_project_keeps_alias() {
        let out = project(
            record(json!({"id": "1", "nick": "bob", "mail": "b@x", "url": "/"})),
            &["nick".to_string(), "url".to_string()],
            "id",
        );
        assert_eq!(out, record(json!({"id": "1", "nick": "bob", "url": "/"})));
    }

    #[test]
    fn test_merge_overrides_fields() {
        let merged = merge(
            &record(json!({"id": 1, "n": 5})),
            &record(json!({"n": 6, "m": true})),
        );
        assert_eq!(merged, record(json!({"id": 1, "n": 6, "m": true})));
    }
}
