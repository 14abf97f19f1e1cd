//! Deta Base query compilation
//!
//! Deta Base queries are flat objects: `{"field": value}` for equality and
//! `{"field?op": value}` for the other operators. A query can hold no
//! boolean logic and no cross-field OR, so a where expression compiles to a
//! [`QueryPlan`]: a list of native queries whose results are concatenated.
//!
//! - `IN` filters are expanded into the Cartesian product of their candidate
//!   values, one native query per tuple.
//! - A string or number equality on the key field becomes a point lookup,
//!   because the fetch index does not cover `key`.
//! - `NOT IN` and `_complex` cannot be expressed and are dropped with a
//!   warning.

use crate::domain::{Filter, LikePattern, Record, Where};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Native query object
pub type DetaCondition = Map<String, Value>;

/// One native request of a plan
#[derive(Debug, Clone, PartialEq)]
pub enum DetaQuery {
    /// Point lookup; `residual` is checked against the fetched item
    Get { key: String, residual: DetaCondition },
    /// Query request; an empty condition matches every item
    Fetch { condition: DetaCondition },
}

/// Native requests standing in for one where expression
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPlan {
    queries: Vec<DetaQuery>,
    suffixes: Vec<(String, String)>,
}

impl QueryPlan {
    pub fn queries(&self) -> &[DetaQuery] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Whether results need [`QueryPlan::accepts`] before windowing
    pub fn has_local_checks(&self) -> bool {
        !self.suffixes.is_empty()
    }

    /// Local checks the service cannot do (suffix LIKE)
    pub fn accepts(&self, record: &Record) -> bool {
        self.suffixes.iter().all(|(field, suffix)| {
            record
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|value| value.ends_with(suffix.as_str()))
        })
    }
}

/// Compile `filter` for a base whose identity field is `native_key`
///
/// The primary-key alias must already be rewritten to `native_key`.
pub fn compile(filter: &Where, native_key: &str) -> QueryPlan {
    if filter.complex().is_some() {
        crate::log_dropped_filter!("deta", "_complex", "boolean combinations are not supported");
    }

    let mut fixed = DetaCondition::new();
    let mut expanded: Vec<(String, Vec<Value>)> = Vec::new();
    let mut suffixes = Vec::new();

    for (field, f) in filter.filters() {
        match f {
            Filter::Eq(value) => {
                fixed.insert(field.to_string(), value.clone());
            }
            Filter::Missing => {
                fixed.insert(field.to_string(), Value::Null);
            }
            Filter::In(values) => expanded.push((field.to_string(), values.clone())),
            Filter::NotIn(_) => {
                crate::log_dropped_filter!("deta", field, "NOT IN is not supported");
            }
            Filter::Like(pattern) => match LikePattern::parse(pattern) {
                Some(LikePattern::Contains(needle)) => {
                    fixed.insert(format!("{field}?contains"), Value::String(needle.to_string()));
                }
                Some(LikePattern::Prefix(prefix)) => {
                    fixed.insert(format!("{field}?pfx"), Value::String(prefix.to_string()));
                }
                Some(LikePattern::Suffix(suffix)) => {
                    // no suffix operator; narrow natively, then check locally
                    fixed.insert(format!("{field}?contains"), Value::String(suffix.to_string()));
                    suffixes.push((field.to_string(), suffix.to_string()));
                }
                None => {
                    crate::log_dropped_filter!("deta", field, "LIKE pattern without %");
                }
            },
            Filter::Ne(value) => {
                fixed.insert(format!("{field}?ne"), value.clone());
            }
            Filter::Gt(value) => {
                fixed.insert(format!("{field}?gt"), value.clone());
            }
            Filter::Unsupported(raw) => {
                crate::log_dropped_filter!("deta", field, format!("unsupported filter {raw}"));
            }
        }
    }

    let queries: Vec<DetaQuery> = cartesian(&fixed, &expanded)
        .into_iter()
        .map(|condition| route(condition, native_key))
        .collect();

    tracing::debug!(
        queries = queries.len(),
        expanded_fields = expanded.len(),
        "Compiled Deta query plan"
    );

    QueryPlan { queries, suffixes }
}

/// One condition per tuple of the candidate lists, last field varying fastest
///
/// An empty candidate list yields no conditions at all.
fn cartesian(fixed: &DetaCondition, expanded: &[(String, Vec<Value>)]) -> Vec<DetaCondition> {
    let mut conditions = vec![fixed.clone()];
    for (field, values) in expanded {
        conditions = conditions
            .iter()
            .flat_map(|condition| {
                values.iter().map(move |value| {
                    let mut next = condition.clone();
                    next.insert(field.clone(), value.clone());
                    next
                })
            })
            .collect();
    }
    conditions
}

fn route(mut condition: DetaCondition, native_key: &str) -> DetaQuery {
    let key = match condition.get(native_key) {
        Some(Value::String(key)) if !key.is_empty() => Some(key.clone()),
        Some(Value::Number(key)) => Some(key.to_string()),
        _ => None,
    };

    match key {
        Some(key) => {
            condition.remove(native_key);
            DetaQuery::Get {
                key,
                residual: condition,
            }
        }
        None => DetaQuery::Fetch { condition },
    }
}

/// Whether `record` satisfies a native condition
///
/// Mirrors the service's operator semantics for the subset this crate emits.
pub fn matches(condition: &DetaCondition, record: &Record) -> bool {
    condition.iter().all(|(key, expected)| {
        let (field, op) = match key.rsplit_once('?') {
            Some((field, op)) => (field, Some(op)),
            None => (key.as_str(), None),
        };
        let actual = record.get(field);

        match op {
            None if expected.is_null() => actual.map_or(true, Value::is_null),
            None => actual == Some(expected),
            Some("ne") => actual != Some(expected),
            Some("gt") => actual.is_some_and(|a| compare(a, expected) == Some(Ordering::Greater)),
            Some("contains") => match (actual, expected) {
                (Some(Value::String(a)), Value::String(e)) => a.contains(e.as_str()),
                (Some(Value::Array(items)), e) => items.contains(e),
                _ => false,
            },
            Some("pfx") => match (actual, expected) {
                (Some(Value::String(a)), Value::String(e)) => a.starts_with(e.as_str()),
                _ => false,
            },
            Some(_) => true,
        }
    })
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
