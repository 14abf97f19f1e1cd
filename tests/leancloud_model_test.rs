//! Integration tests for the LeanCloud model over an in-memory store

mod support;

use dittorm::adapters::leancloud::LeanCloudModel;
use dittorm::adapters::storage::{Model, ModelExt, Update};
use dittorm::domain::{Access, Complex, Logic, SelectOptions, Where};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use support::{record, MemoryLeanCloud};

fn model(store: &Arc<MemoryLeanCloud>) -> LeanCloudModel {
    LeanCloudModel::new("Comment", store.clone(), "id")
}

fn ranked(n: usize) -> Vec<dittorm::Record> {
    (1..=n).map(|rank| record(json!({ "rank": rank }))).collect()
}

fn ranks(records: &[dittorm::Record]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r.get("rank").and_then(Value::as_i64).unwrap())
        .collect()
}

#[tokio::test]
async fn test_select_renames_object_id_to_alias() {
    let store = Arc::new(MemoryLeanCloud::default());
    store.seed([record(json!({"nick": "bob"}))]);

    let records = model(&store)
        .select(&Where::new(), &SelectOptions::default())
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("id"), Some(&json!("obj00000")));
    assert!(records[0].get("objectId").is_none());
}

#[tokio::test]
async fn test_select_pages_through_every_record() {
    let store = Arc::new(MemoryLeanCloud::default());
    store.seed(ranked(250));

    let records = model(&store)
        .select(&Where::new(), &SelectOptions::default())
        .await
        .unwrap();

    assert_eq!(records.len(), 250);
    let finds = store.finds.lock().unwrap();
    assert_eq!(finds.len(), 3);
    assert_eq!(finds[1].skip, Some(100));
    assert_eq!(finds[2].skip, Some(200));
}

#[tokio::test]
async fn test_limit_and_offset_window() {
    let store = Arc::new(MemoryLeanCloud::default());
    store.seed(ranked(20));

    let records = model(&store)
        .select(&Where::new(), &SelectOptions::new().limit(5).offset(12))
        .await
        .unwrap();

    assert_eq!(ranks(&records), [13, 14, 15, 16, 17]);
}

#[tokio::test]
async fn test_desc_orders_server_side() {
    let store = Arc::new(MemoryLeanCloud::default());
    store.seed(ranked(5));

    let records = model(&store)
        .select(&Where::new(), &SelectOptions::new().desc("rank").limit(2))
        .await
        .unwrap();

    assert_eq!(ranks(&records), [5, 4]);
}

#[tokio::test]
async fn test_fields_projection_keeps_primary_key() {
    let store = Arc::new(MemoryLeanCloud::default());
    store.seed([record(json!({"nick": "bob", "mail": "b@example.com"}))]);

    let records = model(&store)
        .select(&Where::new(), &SelectOptions::new().fields(["nick"]))
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![record(json!({"id": "obj00000", "nick": "bob"}))]
    );
}

#[tokio::test]
async fn test_complex_or_combines_per_field_queries() {
    let store = Arc::new(MemoryLeanCloud::default());
    store.seed([
        record(json!({"status": "approved", "url": "/a"})),
        record(json!({"status": "approved", "path": "/a"})),
        record(json!({"status": "spam", "url": "/a"})),
        record(json!({"status": "approved", "url": "/b"})),
    ]);

    let filter = Where::new()
        .eq("status", "approved")
        .with_complex(Complex::new(Logic::Or).eq("url", "/a").eq("path", "/a"));

    assert_eq!(model(&store).count(&filter).await.unwrap(), 2);
}

#[tokio::test]
async fn test_operators_against_store() {
    let store = Arc::new(MemoryLeanCloud::default());
    store.seed([
        record(json!({"n": 1, "tag": "a"})),
        record(json!({"n": 2, "tag": "b"})),
        record(json!({"n": 3})),
    ]);
    let model = model(&store);

    let count = |filter: Where| {
        let model = &model;
        async move { model.count(&filter).await.unwrap() }
    };

    assert_eq!(count(Where::new().is_in("tag", ["a", "b"])).await, 2);
    assert_eq!(count(Where::new().not_in("tag", ["a"])).await, 2);
    assert_eq!(count(Where::new().missing("tag")).await, 1);
    assert_eq!(count(Where::new().ne("n", 2)).await, 2);
    assert_eq!(count(Where::new().gt("n", 1)).await, 2);
}

#[tokio::test]
async fn test_missing_class_reads_as_empty() {
    let store = Arc::new(MemoryLeanCloud::missing_class());
    let model = model(&store);

    let records = model
        .select(&Where::new().eq("nick", "bob"), &SelectOptions::default())
        .await
        .unwrap();
    assert!(records.is_empty());
    assert_eq!(model.count(&Where::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_add_sends_acl_and_strips_alias() {
    let store = Arc::new(MemoryLeanCloud::default());
    let saved = model(&store)
        .add(
            record(json!({"id": "ignored", "nick": "bob"})),
            Access {
                read: true,
                write: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(saved, record(json!({"id": "obj00000", "nick": "bob"})));
    assert_eq!(
        store.acls.lock().unwrap()[0],
        json!({"*": {"read": true}})
    );
}

#[tokio::test]
async fn test_update_skips_unchanged_records() {
    let store = Arc::new(MemoryLeanCloud::default());
    store.seed([
        record(json!({"status": "waiting"})),
        record(json!({"status": "approved"})),
    ]);

    let updated = model(&store)
        .update(
            Update::merge(record(json!({"status": "approved"}))),
            &Where::new(),
        )
        .await
        .unwrap();

    assert_eq!(updated.len(), 2);
    assert_eq!(store.updates.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Comment {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    nick: String,
}

#[tokio::test]
async fn test_typed_round_trip() {
    let store = Arc::new(MemoryLeanCloud::default());
    let model = model(&store);

    let saved: Comment = model
        .add_as(
            &Comment {
                id: None,
                nick: "bob".to_string(),
            },
            Access::default(),
        )
        .await
        .unwrap();

    let found: Vec<Comment> = model
        .select_as(
            &Where::new().eq("id", saved.id.clone()),
            &SelectOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(found, vec![saved]);
}
