//! Offset/limit windows over cursor-paged Deta queries
//!
//! The query endpoint only pages forward by cursor, so an offset is served by
//! replaying pages from the start until `offset + limit` items are in hand.

use super::client::DetaBaseApi;
use super::query::DetaCondition;
use crate::domain::{Record, Result};
use serde_json::Value;

/// Items `offset..offset + limit` of the query, in key order
///
/// With no `limit` every page is read and the first `offset` items dropped.
pub async fn fetch_window(
    base: &dyn DetaBaseApi,
    condition: &DetaCondition,
    limit: Option<usize>,
    offset: usize,
) -> Result<Vec<Record>> {
    if limit == Some(0) {
        return Ok(Vec::new());
    }

    let wanted = limit.map(|limit| offset.saturating_add(limit));
    let mut items: Vec<Record> = Vec::new();
    let mut pages = 0usize;

    loop {
        let cursor = items.last().and_then(|item| match item.get("key") {
            Some(Value::String(key)) => Some(key.clone()),
            _ => None,
        });

        let page = base.fetch(condition, limit, cursor.as_deref()).await?;
        pages += 1;

        let received = page.items.len();
        items.extend(page.items);

        let short = limit.is_some_and(|limit| received < limit);
        let enough = wanted.is_some_and(|wanted| items.len() >= wanted);
        if received == 0 || short || enough || page.last.is_none() {
            break;
        }
    }

    tracing::debug!(
        base = %base.name(),
        pages = pages,
        fetched = items.len(),
        offset = offset,
        "Fetched Deta window"
    );

    let window = items.into_iter().skip(offset);
    Ok(match limit {
        Some(limit) => window.take(limit).collect(),
        None => window.collect(),
    })
}
