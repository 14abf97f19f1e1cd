//! Backend-agnostic where expressions
//!
//! A [`Where`] maps field names to [`Filter`]s, plus an optional [`Complex`]
//! sub-expression that combines single-field overrides with a boolean
//! [`Logic`]. Each storage adapter compiles a `Where` into its own native
//! query form.
//!
//! The JSON shape mirrors what callers of the storage services already use:
//!
//! ```json
//! {
//!   "status": "approved",
//!   "ip": null,
//!   "url": ["IN", ["/a", "/b"]],
//!   "nick": ["LIKE", "%bob%"],
//!   "_complex": { "_logic": "or", "mail": "a@b.c", "link": ["!=", ""] }
//! }
//! ```
//!
//! `null` means "field does not exist". `_complex` and `_logic` are reserved
//! keys and never name data fields.

use crate::domain::{DittormError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reserved key holding the boolean sub-expression
pub const COMPLEX_KEY: &str = "_complex";

/// Reserved key selecting the combinator inside `_complex`
pub const LOGIC_KEY: &str = "_logic";

/// Tagged filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Set membership
    In,
    /// Set exclusion
    NotIn,
    /// `%`-wildcard pattern match
    Like,
    /// Inequality
    Ne,
    /// Strictly greater than
    Gt,
}

impl Operator {
    /// Wire tag of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Like => "LIKE",
            Operator::Ne => "!=",
            Operator::Gt => ">",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            "LIKE" => Ok(Operator::Like),
            "!=" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            other => Err(format!("Unknown operator: {other}")),
        }
    }
}

/// A single field filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Strict equality with a scalar
    Eq(Value),
    /// Field does not exist
    Missing,
    /// Field value is one of the candidates
    In(Vec<Value>),
    /// Field value is none of the candidates
    NotIn(Vec<Value>),
    /// `%x%` contains, `x%` prefix, `%x` suffix
    Like(String),
    /// Field value differs
    Ne(Value),
    /// Field value is greater
    Gt(Value),
    /// Anything the grammar does not recognize; compiled as a no-op
    Unsupported(Value),
}

impl Filter {
    /// Read a filter from its JSON form
    ///
    /// Unknown operators and nested objects do not fail: they become
    /// [`Filter::Unsupported`] and apply no constraint.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Filter::Missing,
            Value::Bool(_) | Value::Number(_) | Value::String(_) => Filter::Eq(value),
            Value::Array(items) => Self::from_tagged(items),
            other => Filter::Unsupported(other),
        }
    }

    fn from_tagged(items: Vec<Value>) -> Self {
        let parsed = items
            .first()
            .and_then(Value::as_str)
            .map(str::parse::<Operator>);
        let operator = match parsed {
            Some(Ok(operator)) => operator,
            _ => return Filter::Unsupported(Value::Array(items)),
        };
        let operand = items.get(1).cloned().unwrap_or(Value::Null);

        match (operator, operand) {
            (Operator::In, Value::Array(values)) => Filter::In(values),
            (Operator::In, value) => Filter::In(vec![value]),
            (Operator::NotIn, Value::Array(values)) => Filter::NotIn(values),
            (Operator::NotIn, value) => Filter::NotIn(vec![value]),
            (Operator::Like, Value::String(pattern)) => Filter::Like(pattern),
            (Operator::Ne, value) => Filter::Ne(value),
            (Operator::Gt, value) => Filter::Gt(value),
            _ => Filter::Unsupported(Value::Array(items)),
        }
    }

    /// JSON form of the filter
    pub fn to_json(&self) -> Value {
        let tagged = |operator: Operator, operand: Value| {
            Value::Array(vec![Value::String(operator.as_str().to_string()), operand])
        };

        match self {
            Filter::Eq(value) => value.clone(),
            Filter::Missing => Value::Null,
            Filter::In(values) => tagged(Operator::In, Value::Array(values.clone())),
            Filter::NotIn(values) => tagged(Operator::NotIn, Value::Array(values.clone())),
            Filter::Like(pattern) => tagged(Operator::Like, Value::String(pattern.clone())),
            Filter::Ne(value) => tagged(Operator::Ne, value.clone()),
            Filter::Gt(value) => tagged(Operator::Gt, value.clone()),
            Filter::Unsupported(raw) => raw.clone(),
        }
    }

    /// Operator of a tagged filter
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Filter::In(_) => Some(Operator::In),
            Filter::NotIn(_) => Some(Operator::NotIn),
            Filter::Like(_) => Some(Operator::Like),
            Filter::Ne(_) => Some(Operator::Ne),
            Filter::Gt(_) => Some(Operator::Gt),
            Filter::Eq(_) | Filter::Missing | Filter::Unsupported(_) => None,
        }
    }
}

/// Parsed LIKE pattern
///
/// Only a leading and/or trailing `%` is meaningful. A pattern with no `%`
/// at either end does not parse and applies no constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikePattern<'a> {
    /// `%x%`
    Contains(&'a str),
    /// `x%`
    Prefix(&'a str),
    /// `%x`
    Suffix(&'a str),
}

impl<'a> LikePattern<'a> {
    pub fn parse(pattern: &'a str) -> Option<Self> {
        let leading = pattern.starts_with('%');
        let trailing = pattern.ends_with('%');

        match (leading, trailing) {
            (true, true) => Some(LikePattern::Contains(
                pattern.get(1..pattern.len() - 1).unwrap_or(""),
            )),
            (true, false) => Some(LikePattern::Suffix(&pattern[1..])),
            (false, true) => Some(LikePattern::Prefix(&pattern[..pattern.len() - 1])),
            (false, false) => None,
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            LikePattern::Contains(needle) => value.contains(needle),
            LikePattern::Prefix(prefix) => value.starts_with(prefix),
            LikePattern::Suffix(suffix) => value.ends_with(suffix),
        }
    }
}

/// Boolean combinator of a complex filter
///
/// `and`/`or` work on every backend; `not`/`nor` only where the native query
/// language has them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    #[default]
    And,
    Or,
    Not,
    Nor,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "and",
            Logic::Or => "or",
            Logic::Not => "not",
            Logic::Nor => "nor",
        }
    }
}

impl FromStr for Logic {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "and" => Ok(Logic::And),
            "or" => Ok(Logic::Or),
            "not" => Ok(Logic::Not),
            "nor" => Ok(Logic::Nor),
            other => Err(format!("Unknown logic '{other}'. Must be one of: and, or, not, nor")),
        }
    }
}

/// Boolean sub-expression stored under `_complex`
///
/// Every field filter is combined with the outer [`Where`] separately; the
/// resulting per-field queries are joined with [`Complex::logic`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Complex {
    logic: Logic,
    filters: BTreeMap<String, Filter>,
}

impl Complex {
    pub fn new(logic: Logic) -> Self {
        Self {
            logic,
            filters: BTreeMap::new(),
        }
    }

    /// Add a field filter; the reserved `_logic` key is ignored
    pub fn filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        let field = field.into();
        if field != LOGIC_KEY && field != COMPLEX_KEY {
            self.filters.insert(field, filter);
        }
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let filter = equality(value.into());
        self.filter(field, filter)
    }

    pub fn logic(&self) -> Logic {
        self.logic
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    fn from_json(map: Map<String, Value>) -> Result<Self> {
        let mut complex = Complex::default();
        for (key, value) in map {
            if key == LOGIC_KEY {
                let logic = value.as_str().ok_or_else(|| {
                    DittormError::InvalidCondition(format!("{LOGIC_KEY} must be a string"))
                })?;
                complex.logic = logic.parse().map_err(DittormError::InvalidCondition)?;
                continue;
            }
            complex = complex.filter(key, Filter::from_json(value));
        }
        Ok(complex)
    }

    fn to_json(&self) -> Value {
        let mut map: Map<String, Value> = self
            .filters
            .iter()
            .map(|(k, f)| (k.clone(), f.to_json()))
            .collect();
        map.insert(
            LOGIC_KEY.to_string(),
            Value::String(self.logic.as_str().to_string()),
        );
        Value::Object(map)
    }

    fn rename_field(&self, from: &str, to: &str) -> Self {
        Self {
            logic: self.logic,
            filters: rename_key(&self.filters, from, to),
        }
    }
}

/// Backend-agnostic filter expression
///
/// An empty `Where` matches every record.
///
/// # Examples
///
/// ```
/// use dittorm::domain::condition::{Complex, Filter, Logic, Where};
///
/// let filter = Where::new()
///     .eq("status", "approved")
///     .is_in("url", ["/a", "/b"])
///     .like("nick", "%bob%")
///     .with_complex(Complex::new(Logic::Or).eq("mail", "a@b.c"));
///
/// assert_eq!(filter.get("status"), Some(&Filter::Eq("approved".into())));
/// assert!(filter.complex().is_some());
///
/// let parsed: Where = r#"{"status": "approved"}"#.parse().unwrap();
/// assert_eq!(parsed, Where::new().eq("status", "approved"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Where {
    filters: BTreeMap<String, Filter>,
    complex: Option<Complex>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// No field filters and no complex filter
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.complex.is_none()
    }

    /// Add a field filter, replacing any previous filter on that field
    pub fn filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        let field = field.into();
        if field != COMPLEX_KEY && field != LOGIC_KEY {
            self.filters.insert(field, filter);
        }
        self
    }

    /// Equality; a JSON `null` value means "field does not exist"
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let filter = equality(value.into());
        self.filter(field, filter)
    }

    pub fn missing(self, field: impl Into<String>) -> Self {
        self.filter(field, Filter::Missing)
    }

    pub fn is_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(field, Filter::In(values))
    }

    pub fn not_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(field, Filter::NotIn(values))
    }

    pub fn like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filter(field, Filter::Like(pattern.into()))
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Filter::Ne(value.into()))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Filter::Gt(value.into()))
    }

    pub fn with_complex(mut self, complex: Complex) -> Self {
        self.complex = Some(complex);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Filter> {
        self.filters.get(field)
    }

    /// Plain field filters, reserved keys excluded
    pub fn filters(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn complex(&self) -> Option<&Complex> {
        self.complex.as_ref()
    }

    /// Number of plain field filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// The plain filters with `field` overridden by `filter`, no complex part
    pub fn with_override(&self, field: &str, filter: &Filter) -> Where {
        let mut filters = self.filters.clone();
        filters.insert(field.to_string(), filter.clone());
        Where {
            filters,
            complex: None,
        }
    }

    /// Rename a field everywhere it appears, including inside `_complex`
    ///
    /// Used at the facade boundary to turn the primary-key alias into the
    /// backend's native key field before compiling.
    pub fn rename_field(&self, from: &str, to: &str) -> Where {
        if from == to {
            return self.clone();
        }
        Where {
            filters: rename_key(&self.filters, from, to),
            complex: self.complex.as_ref().map(|c| c.rename_field(from, to)),
        }
    }

    /// Read a where expression from its JSON form; `null` is the empty expression
    pub fn from_json(value: Value) -> Result<Self> {
        let map = match value {
            Value::Null => return Ok(Where::new()),
            Value::Object(map) => map,
            other => {
                return Err(DittormError::InvalidCondition(format!(
                    "where expression must be a JSON object, got: {other}"
                )))
            }
        };

        let mut filter = Where::new();
        for (key, value) in map {
            match key.as_str() {
                COMPLEX_KEY => match value {
                    Value::Object(inner) => {
                        filter.complex = Some(Complex::from_json(inner)?);
                    }
                    other => {
                        return Err(DittormError::InvalidCondition(format!(
                            "{COMPLEX_KEY} must be a JSON object, got: {other}"
                        )))
                    }
                },
                LOGIC_KEY => continue,
                _ => {
                    filter.filters.insert(key, Filter::from_json(value));
                }
            }
        }
        Ok(filter)
    }

    /// JSON form of the expression
    pub fn to_json(&self) -> Value {
        let mut map: Map<String, Value> = self
            .filters
            .iter()
            .map(|(k, f)| (k.clone(), f.to_json()))
            .collect();
        if let Some(complex) = &self.complex {
            map.insert(COMPLEX_KEY.to_string(), complex.to_json());
        }
        Value::Object(map)
    }
}

impl TryFrom<Value> for Where {
    type Error = DittormError;

    fn try_from(value: Value) -> Result<Self> {
        Where::from_json(value)
    }
}

impl From<Where> for Value {
    fn from(filter: Where) -> Self {
        filter.to_json()
    }
}

impl FromStr for Where {
    type Err = DittormError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Where::new());
        }
        let value: Value = serde_json::from_str(s)
            .map_err(|e| DittormError::InvalidCondition(format!("invalid JSON: {e}")))?;
        Where::from_json(value)
    }
}

fn equality(value: Value) -> Filter {
    if value.is_null() {
        Filter::Missing
    } else {
        Filter::Eq(value)
    }
}

fn rename_key(
    filters: &BTreeMap<String, Filter>,
    from: &str,
    to: &str,
) -> BTreeMap<String, Filter> {
    filters
        .iter()
        .map(|(k, f)| {
            let key = if k == from { to.to_string() } else { k.clone() };
            (key, f.clone())
        })
        .collect()
}
