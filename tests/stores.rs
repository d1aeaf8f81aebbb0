//! Store properties against the in-memory backend.

mod common;

use common::*;
use migrant::models::{ComponentKind, MigrationLogEntry, MigrationStatus};
use migrant::store::KnowledgeStore;

fn store() -> KnowledgeStore {
    KnowledgeStore::in_memory(DIM)
}

#[tokio::test]
async fn test_idempotent_upsert() {
    check_idempotent_upsert(&store(), "mem").await;
}

#[tokio::test]
async fn test_similarity_search() {
    check_similarity_search(&store(), "mem").await;
}

#[tokio::test]
async fn test_zero_norm_search() {
    check_zero_norm_search(&store(), "mem").await;
}

#[tokio::test]
async fn test_dangling_edges() {
    check_dangling_edges(&store(), "mem").await;
}

#[tokio::test]
async fn test_bounded_traversal() {
    check_bounded_traversal(&store(), "mem").await;
}

#[tokio::test]
async fn test_strength_ordering() {
    check_strength_ordering(&store(), "mem").await;
}

#[tokio::test]
async fn test_schema_round_trip() {
    check_schema_round_trip(&store(), "mem").await;
}

#[tokio::test]
async fn test_keyword_search() {
    check_keyword_search(&store(), "mem").await;
}

#[tokio::test]
async fn test_wrong_dimension_is_rejected_before_write() {
    let store = store();
    let mut c = component("mem/Bad.cs", "Bad", ComponentKind::Model, [0.0; DIM]);
    c.embedding = vec![1.0; DIM + 1];

    let err = store.vectors.add_code_vector(&c).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Embedding dimension mismatch: expected {}, got {}", DIM, DIM + 1)
    );
    assert!(store.vectors.get_component_by_id(&c.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_report_groups_by_type_and_status() {
    let store = store();
    let now = chrono::Utc::now();
    let entries = [
        (ComponentKind::Controller, MigrationStatus::Success),
        (ComponentKind::Controller, MigrationStatus::Failure),
        (ComponentKind::Controller, MigrationStatus::Success),
        (ComponentKind::Service, MigrationStatus::Success),
    ];
    for (i, (kind, status)) in entries.into_iter().enumerate() {
        store
            .log
            .append(&MigrationLogEntry {
                component_id: format!("c{}", i),
                component_type: kind,
                status,
                start_time: now,
                end_time: now,
                output: String::new(),
            })
            .await
            .unwrap();
    }

    let report = store.log.report().await.unwrap();
    let rows: Vec<(ComponentKind, MigrationStatus, i64)> = report
        .into_iter()
        .map(|r| (r.component_type, r.status, r.count))
        .collect();
    assert_eq!(
        rows,
        vec![
            (ComponentKind::Controller, MigrationStatus::Failure, 1),
            (ComponentKind::Controller, MigrationStatus::Success, 2),
            (ComponentKind::Service, MigrationStatus::Success, 1),
        ]
    );
    assert_eq!(store.log.entries().await.unwrap().len(), 4);
}
