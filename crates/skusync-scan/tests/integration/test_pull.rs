//! Pull synchronizer tests: policy application on linked records

use std::sync::Arc;

use skusync_core::domain::conflict::ConflictPolicy;
use skusync_core::domain::newtypes::Sku;
use skusync_core::domain::record::{CatalogRecord, SourceLink};
use skusync_core::ports::catalog::ICatalogRepository;
use skusync_core::ports::source_adapter::ISourceAdapter;
use skusync_scan::PullSynchronizer;
use skusync_store::SqliteStore;

use crate::common::{erp_a, external, insert_internal, store, MockAdapter};

async fn link(store: &Arc<SqliteStore>, record: &CatalogRecord, external_id: &str) {
    let link = SourceLink::new(record.id, erp_a(), external_id);
    store.upsert_link(&link).await.unwrap();
}

async fn pull(
    store: &Arc<SqliteStore>,
    policy: ConflictPolicy,
    adapter: MockAdapter,
) -> skusync_scan::PullSummary {
    let adapter: Arc<dyn ISourceAdapter> = Arc::new(adapter);
    PullSynchronizer::new(store.clone(), policy)
        .pull(&adapter)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_external_wins_updates_fields_and_marks_link_synced() {
    let store = store().await;
    let source = erp_a();
    let record = insert_internal(store.as_ref(), "A", "Alpha").await;
    link(&store, &record, "ext-A").await;

    let adapter =
        MockAdapter::new(source.clone()).with_record(external(&source, "A", "Alpha Mk II"));
    let summary = pull(&store, ConflictPolicy::ExternalWins, adapter).await;

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.conflicted, 0);

    let reloaded = store
        .get_record_by_sku(&Sku::new("A").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.name, "Alpha Mk II");
    let link = reloaded.link_for(&source).unwrap();
    assert!(link.synced);
    assert!(!link.has_conflicts);
    assert!(link.last_synced_at.is_some());
}

#[tokio::test]
async fn test_manual_policy_records_conflicts_without_touching_the_record() {
    let store = store().await;
    let source = erp_a();
    let record = insert_internal(store.as_ref(), "A", "Alpha").await;
    link(&store, &record, "ext-A").await;

    let adapter =
        MockAdapter::new(source.clone()).with_record(external(&source, "A", "Alpha Mk II"));
    let summary = pull(&store, ConflictPolicy::Manual, adapter).await;

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.conflicted, 1);

    let reloaded = store
        .get_record_by_sku(&Sku::new("A").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.name, "Alpha");
    let link = reloaded.link_for(&source).unwrap();
    assert!(link.has_conflicts);
    let conflicts = link.conflicts.as_ref().unwrap();
    assert!(conflicts.iter().any(|diff| diff.field == "name"));
    assert!(link.conflicts_detected_at.is_some());
}

#[tokio::test]
async fn test_internal_wins_leaves_record_and_link_untouched() {
    let store = store().await;
    let source = erp_a();
    let record = insert_internal(store.as_ref(), "A", "Alpha").await;
    link(&store, &record, "ext-A").await;

    let adapter =
        MockAdapter::new(source.clone()).with_record(external(&source, "A", "Alpha Mk II"));
    let summary = pull(&store, ConflictPolicy::InternalWins, adapter).await;

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.conflicted, 0);
    assert_eq!(summary.errors, 0);

    let reloaded = store
        .get_record_by_sku(&Sku::new("A").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.name, "Alpha");
    let link = reloaded.link_for(&source).unwrap();
    assert!(!link.synced);
    assert!(!link.has_conflicts);
}

#[tokio::test]
async fn test_record_deleted_upstream_clears_the_link() {
    let store = store().await;
    let source = erp_a();
    let record = insert_internal(store.as_ref(), "A", "Alpha").await;
    link(&store, &record, "ext-A").await;

    // The mock has no record for SKU A, so the fetch returns None.
    let summary = pull(&store, ConflictPolicy::ExternalWins, MockAdapter::new(source.clone())).await;

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.unlinked, 1);
    assert_eq!(summary.errors, 0);

    let reloaded = store
        .get_record_by_sku(&Sku::new("A").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.link_for(&source).is_none());
    assert!(store
        .list_linked_records(&source)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_fetch_failure_counts_an_error_and_keeps_the_link() {
    let store = store().await;
    let source = erp_a();
    let record = insert_internal(store.as_ref(), "A", "Alpha").await;
    link(&store, &record, "ext-A").await;

    let adapter = MockAdapter::new(source.clone())
        .with_record(external(&source, "A", "Alpha Mk II"))
        .failing_sku("A");
    let summary = pull(&store, ConflictPolicy::ExternalWins, adapter).await;

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.errors, 1);

    let reloaded = store
        .get_record_by_sku(&Sku::new("A").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.name, "Alpha");
    assert!(reloaded.link_for(&source).is_some());
}

#[tokio::test]
async fn test_pull_only_touches_records_linked_to_the_source() {
    let store = store().await;
    let source = erp_a();
    let linked = insert_internal(store.as_ref(), "A", "Alpha").await;
    link(&store, &linked, "ext-A").await;
    // B exists but carries no link, so the pull never sees it.
    insert_internal(store.as_ref(), "B", "Beta").await;

    let adapter = MockAdapter::new(source.clone())
        .with_record(external(&source, "A", "Alpha"))
        .with_record(external(&source, "B", "Beta Mk II"));
    let summary = pull(&store, ConflictPolicy::ExternalWins, adapter).await;

    assert_eq!(summary.checked, 1);

    let untouched = store
        .get_record_by_sku(&Sku::new("B").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.name, "Beta");
}
