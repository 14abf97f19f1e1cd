//! Select options and record access flags

use serde::{Deserialize, Serialize};

/// Options accepted by `select`
///
/// # Examples
///
/// ```
/// use dittorm::domain::options::SelectOptions;
///
/// let options = SelectOptions::new()
///     .limit(10)
///     .offset(20)
///     .desc("insertedAt")
///     .fields(["nick", "comment"]);
///
/// assert_eq!(options.limit, Some(10));
/// assert_eq!(options.fields.as_deref().map(|f| f.len()), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOptions {
    /// Maximum number of records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Number of records to skip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,

    /// Sort field, single-field descending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// Projection allowlist; the primary-key alias is always kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.desc = Some(field.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Public read/write access of a created record
///
/// Only the LeanCloud backend has per-record ACLs; Deta ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    pub read: bool,
    pub write: bool,
}

impl Default for Access {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}
