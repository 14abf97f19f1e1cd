//! LeanCloud query building and where-expression compilation
//!
//! [`LeanQuery`] is a small builder over LeanCloud's `where` JSON (the same
//! constraint vocabulary as the JS SDK's `AV.Query`). [`compile`] turns a
//! backend-agnostic [`Where`] into one.

use crate::domain::{Filter, LikePattern, Logic, Where};
use serde_json::{json, Map, Value};

/// Native LeanCloud query for one class
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeanQuery {
    class_name: String,
    condition: Map<String, Value>,
}

impl LeanQuery {
    /// Unfiltered query on `class_name`
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            condition: Map::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The `where` object sent to the REST API
    pub fn condition(&self) -> &Map<String, Value> {
        &self.condition
    }

    pub fn is_unfiltered(&self) -> bool {
        self.condition.is_empty()
    }

    /// `where` parameter as a JSON string, `None` when unfiltered
    pub fn where_param(&self) -> Option<String> {
        if self.condition.is_empty() {
            None
        } else {
            Some(Value::Object(self.condition.clone()).to_string())
        }
    }

    pub fn equal_to(&mut self, field: &str, value: Value) -> &mut Self {
        self.condition.insert(field.to_string(), value);
        self
    }

    pub fn does_not_exist(&mut self, field: &str) -> &mut Self {
        self.constraint(field, "$exists", Value::Bool(false))
    }

    pub fn contained_in(&mut self, field: &str, values: Vec<Value>) -> &mut Self {
        self.constraint(field, "$in", Value::Array(values))
    }

    pub fn not_contained_in(&mut self, field: &str, values: Vec<Value>) -> &mut Self {
        self.constraint(field, "$nin", Value::Array(values))
    }

    pub fn contains(&mut self, field: &str, needle: &str) -> &mut Self {
        self.constraint(field, "$regex", Value::String(regex::escape(needle)))
    }

    pub fn starts_with(&mut self, field: &str, prefix: &str) -> &mut Self {
        let pattern = format!("^{}", regex::escape(prefix));
        self.constraint(field, "$regex", Value::String(pattern))
    }

    pub fn ends_with(&mut self, field: &str, suffix: &str) -> &mut Self {
        let pattern = format!("{}$", regex::escape(suffix));
        self.constraint(field, "$regex", Value::String(pattern))
    }

    pub fn not_equal_to(&mut self, field: &str, value: Value) -> &mut Self {
        self.constraint(field, "$ne", value)
    }

    pub fn greater_than(&mut self, field: &str, value: Value) -> &mut Self {
        self.constraint(field, "$gt", value)
    }

    /// Join per-field queries with a boolean combinator
    ///
    /// `not` negates the conjunction of `queries`; `nor` matches records
    /// matching none of them.
    pub fn combine(class_name: impl Into<String>, logic: Logic, queries: Vec<LeanQuery>) -> Self {
        let conditions: Vec<Value> = queries
            .into_iter()
            .map(|q| Value::Object(q.condition))
            .collect();

        let condition = match logic {
            Logic::And => json!({ "$and": conditions }),
            Logic::Or => json!({ "$or": conditions }),
            Logic::Nor => json!({ "$nor": conditions }),
            Logic::Not => json!({ "$nor": [{ "$and": conditions }] }),
        };

        Self {
            class_name: class_name.into(),
            condition: match condition {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    fn constraint(&mut self, field: &str, operator: &str, value: Value) -> &mut Self {
        let entry = self
            .condition
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        // an operator next to a plain equality replaces it
        if !is_operator_object(entry) {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(ops) = entry {
            ops.insert(operator.to_string(), value);
        }
        self
    }
}

fn is_operator_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

/// Compile a where expression for `class_name`
///
/// The primary-key alias must already be rewritten to `objectId`. Filters the
/// grammar does not recognize apply no constraint.
///
/// With `_complex`, one query is built per complex field (outer filters plus
/// that field) and the queries are joined with the complex logic.
pub fn compile(class_name: &str, filter: &Where) -> LeanQuery {
    let query = match filter.complex() {
        Some(complex) if !complex.is_empty() => {
            let queries = complex
                .filters()
                .map(|(field, f)| plain(class_name, &filter.with_override(field, f)))
                .collect();
            LeanQuery::combine(class_name, complex.logic(), queries)
        }
        _ => plain(class_name, filter),
    };

    let condition = Value::Object(query.condition.clone());
    tracing::debug!(
        class = %class_name,
        condition = %condition,
        "Compiled LeanCloud query"
    );

    query
}

fn plain(class_name: &str, filter: &Where) -> LeanQuery {
    let mut query = LeanQuery::new(class_name);
    for (field, f) in filter.filters() {
        apply(&mut query, field, f);
    }
    query
}

fn apply(query: &mut LeanQuery, field: &str, filter: &Filter) {
    match filter {
        Filter::Eq(value) => {
            query.equal_to(field, value.clone());
        }
        Filter::Missing => {
            query.does_not_exist(field);
        }
        Filter::In(values) => {
            query.contained_in(field, values.clone());
        }
        Filter::NotIn(values) => {
            query.not_contained_in(field, values.clone());
        }
        Filter::Like(pattern) => match LikePattern::parse(pattern) {
            Some(LikePattern::Contains(needle)) => {
                query.contains(field, needle);
            }
            Some(LikePattern::Prefix(prefix)) => {
                query.starts_with(field, prefix);
            }
            Some(LikePattern::Suffix(suffix)) => {
                query.ends_with(field, suffix);
            }
            None => {
                crate::log_dropped_filter!("leancloud", field, "LIKE pattern without %");
            }
        },
        Filter::Ne(value) => {
            query.not_equal_to(field, value.clone());
        }
        Filter::Gt(value) => {
            query.greater_than(field, value.clone());
        }
        Filter::Unsupported(raw) => {
            crate::log_dropped_filter!("leancloud", field, format!("unsupported filter {raw}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Complex;

    #[test]
    fn test_empty_where_is_unfiltered() {
        let query = compile("Comment", &Where::new());
        assert_eq!(query.class_name(), "Comment");
        assert!(query.is_unfiltered());
        assert!(query.where_param().is_none());
    }

    #[test]
    fn test_plain_operators() {
        let filter = Where::new()
            .eq("status", "approved")
            .missing("ip")
            .is_in("url", ["/a", "/b"])
            .not_in("nick", ["spam"])
            .ne("mail", "")
            .gt("like", 3);

        let query = compile("Comment", &filter);
        assert_eq!(
            Value::Object(query.condition().clone()),
            json!({
                "status": "approved",
                "ip": {"$exists": false},
                "url": {"$in": ["/a", "/b"]},
                "nick": {"$nin": ["spam"]},
                "mail": {"$ne": ""},
                "like": {"$gt": 3}
            })
        );
    }

    #[test]
    fn test_like_patterns_are_escaped_regexes() {
        let contains = compile("C", &Where::new().like("url", "%a.b%"));
        assert_eq!(contains.condition()["url"], json!({"$regex": "a\\.b"}));

        let prefix = compile("C", &Where::new().like("url", "/post%"));
        assert_eq!(prefix.condition()["url"], json!({"$regex": "^/post"}));

        let suffix = compile("C", &Where::new().like("url", "%.html"));
        assert_eq!(suffix.condition()["url"], json!({"$regex": "\\.html$"}));
    }

    #[test]
    fn test_unrecognized_filters_are_dropped() {
        let filter = Where::from_json(json!({
            "a": ["BETWEEN", [1, 2]],
            "b": ["LIKE", "plain"],
            "c": 1
        }))
        .unwrap();

        let query = compile("C", &filter);
        assert_eq!(Value::Object(query.condition().clone()), json!({"c": 1}));
    }

    #[test]
    fn test_complex_or_builds_one_query_per_field() {
        let filter = Where::new().eq("status", "approved").with_complex(
            Complex::new(Logic::Or)
                .eq("url", "/a")
                .filter("nick", Filter::Like("bob%".to_string())),
        );

        let query = compile("Comment", &filter);
        assert_eq!(
            Value::Object(query.condition().clone()),
            json!({
                "$or": [
                    {"nick": {"$regex": "^bob"}, "status": "approved"},
                    {"status": "approved", "url": "/a"}
                ]
            })
        );
    }

    #[test]
    fn test_complex_not_and_nor() {
        let complex = Complex::new(Logic::Not).eq("a", 1).eq("b", 2);
        let query = compile("C", &Where::new().with_complex(complex));
        assert_eq!(
            Value::Object(query.condition().clone()),
            json!({"$nor": [{"$and": [{"a": 1}, {"b": 2}]}]})
        );

        let complex = Complex::new(Logic::Nor).eq("a", 1);
        let query = compile("C", &Where::new().with_complex(complex));
        assert_eq!(
            Value::Object(query.condition().clone()),
            json!({"$nor": [{"a": 1}]})
        );
    }

    #[test]
    fn test_empty_complex_falls_back_to_plain_filters() {
        let filter = Where::new()
            .eq("a", 1)
            .with_complex(Complex::new(Logic::Or));
        let query = compile("C", &filter);
        assert_eq!(Value::Object(query.condition().clone()), json!({"a": 1}));
    }

    #[test]
    fn test_operator_replaces_plain_equality() {
        let mut query = LeanQuery::new("C");
        query.equal_to("a", json!(1)).greater_than("a", json!(0));
        assert_eq!(query.condition()["a"], json!({"$gt": 0}));
    }
}
