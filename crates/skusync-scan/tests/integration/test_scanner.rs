//! Algorithm tests: classification, set differences, batching, cancellation

use std::sync::Arc;

use skusync_core::domain::record::{SourceRef, SourceType};
use skusync_core::domain::scan_result::{MatchStatus, ResolutionStatus};
use skusync_core::domain::record::SourceLink;
use skusync_core::domain::session::{ScanKind, ScanSession};
use skusync_core::ports::catalog::ICatalogRepository;
use skusync_core::ports::scan_store::{IScanStore, ResultFilter};
use skusync_core::ports::source_adapter::ISourceAdapter;
use skusync_scan::{ScanOutcome, Scanner};
use skusync_store::SqliteStore;

use crate::common::{erp_a, external, insert_internal, internal, store, MockAdapter};

fn scanner(store: &Arc<SqliteStore>, batch_size: usize) -> Scanner {
    Scanner::new(store.clone(), store.clone(), batch_size)
}

async fn running_session(store: &Arc<SqliteStore>, kind: ScanKind) -> ScanSession {
    let mut session = ScanSession::new(erp_a(), kind);
    session.start().unwrap();
    store.create_session(&session).await.unwrap();
    session
}

async fn run(
    store: &Arc<SqliteStore>,
    session: &mut ScanSession,
    adapter: MockAdapter,
) -> ScanOutcome {
    let adapter: Arc<dyn ISourceAdapter> = Arc::new(adapter);
    let external_skus = adapter.list_skus().await.unwrap();
    scanner(store, 100)
        .run(session, &adapter, external_skus)
        .await
        .unwrap()
}

// ============================================================================
// Link scan
// ============================================================================

#[tokio::test]
async fn test_link_scan_classifies_each_internal_record() {
    let store = store().await;
    // Internal {A, B, C} against external {B, C, D}.
    insert_internal(store.as_ref(), "A", "Alpha").await;
    insert_internal(store.as_ref(), "B", "Beta").await;
    insert_internal(store.as_ref(), "C", "Gamma").await;

    let source = erp_a();
    let adapter = MockAdapter::new(source.clone())
        .with_record(external(&source, "B", "Beta"))
        .with_record(external(&source, "C", "Gamma Pro"))
        .with_record(external(&source, "D", "Delta"));

    let mut session = running_session(&store, ScanKind::LinkScan).await;
    let outcome = run(&store, &mut session, adapter).await;
    assert!(matches!(outcome, ScanOutcome::Completed(_)));

    let loaded = store.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.total_scanned(), 3);
    assert_eq!(loaded.matched_count(), 2); // matched B + conflict C
    assert_eq!(loaded.unmatched_count(), 1); // A
    assert_eq!(loaded.errors_count(), 0);
    assert_eq!(loaded.expected_total(), Some(3));

    let page = store
        .query_results(&ResultFilter::for_session(*session.id()))
        .await
        .unwrap();
    assert_eq!(page.total, 3);

    let by_sku = |sku: &str| {
        page.results
            .iter()
            .find(|r| r.sku() == sku)
            .unwrap_or_else(|| panic!("no result for {sku}"))
    };
    assert_eq!(by_sku("A").match_status(), MatchStatus::Unmatched);
    assert!(by_sku("A").external_id().is_none());
    assert_eq!(by_sku("B").match_status(), MatchStatus::Matched);
    assert!(by_sku("B").diff().is_none());
    assert_eq!(by_sku("C").match_status(), MatchStatus::Conflict);
    let diff = by_sku("C").diff().unwrap();
    assert!(!diff.is_empty());
    assert!(diff.iter().any(|d| d.field == "name"));
    // External-only D produces no row in a link scan.
    assert!(page.results.iter().all(|r| r.sku() != "D"));
}

#[tokio::test]
async fn test_link_scan_already_linked_short_circuits() {
    let store = store().await;
    let source = erp_a();
    let record = insert_internal(store.as_ref(), "B", "Beta").await;
    store
        .upsert_link(&SourceLink::new(record.id, source.clone(), "ext-B"))
        .await
        .unwrap();

    // The external side differs, but linked records are not re-diffed here.
    let adapter =
        MockAdapter::new(source.clone()).with_record(external(&source, "B", "Beta Renamed"));

    let mut session = running_session(&store, ScanKind::LinkScan).await;
    run(&store, &mut session, adapter).await;

    let page = store
        .query_results(&ResultFilter::for_session(*session.id()))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let result = &page.results[0];
    assert_eq!(result.match_status(), MatchStatus::AlreadyLinked);
    assert_eq!(result.resolution_status(), ResolutionStatus::Linked);
    assert_eq!(result.external_id(), Some("ext-B"));

    let loaded = store.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.matched_count(), 1);
}

#[tokio::test]
async fn test_link_scan_detail_failure_counts_error() {
    let store = store().await;
    insert_internal(store.as_ref(), "A", "Alpha").await;
    insert_internal(store.as_ref(), "B", "Beta").await;

    let source = erp_a();
    let adapter = MockAdapter::new(source.clone())
        .with_record(external(&source, "A", "Alpha"))
        .with_record(external(&source, "B", "Beta"))
        .failing_sku("B");

    let mut session = running_session(&store, ScanKind::LinkScan).await;
    let outcome = run(&store, &mut session, adapter).await;
    assert!(matches!(outcome, ScanOutcome::Completed(_)));

    let loaded = store.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.total_scanned(), 2);
    assert_eq!(loaded.matched_count(), 1);
    assert_eq!(loaded.errors_count(), 1);
    assert_eq!(
        loaded.matched_count() + loaded.unmatched_count() + loaded.errors_count(),
        loaded.total_scanned()
    );

    // The failed record has no row.
    let page = store
        .query_results(&ResultFilter::for_session(*session.id()))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.results[0].sku(), "A");
}

#[tokio::test]
async fn test_duplicate_skus_first_record_wins() {
    let store = store().await;
    let mut first = internal("DUP", "First");
    let mut second = internal("DUP", "Second");
    first.id = "00000000-0000-4000-8000-000000000001".parse().unwrap();
    second.id = "00000000-0000-4000-8000-000000000002".parse().unwrap();
    store.insert_record(&second).await.unwrap();
    store.insert_record(&first).await.unwrap();

    let source = erp_a();
    let adapter = MockAdapter::new(source.clone()).with_record(external(&source, "DUP", "First"));

    let mut session = running_session(&store, ScanKind::LinkScan).await;
    run(&store, &mut session, adapter).await;

    let loaded = store.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.total_scanned(), 1);

    let page = store
        .query_results(&ResultFilter::for_session(*session.id()))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.results[0].internal_record_id(), Some(&first.id));
    assert_eq!(page.results[0].match_status(), MatchStatus::Matched);
}

#[tokio::test]
async fn test_blank_skus_are_excluded() {
    let store = store().await;
    insert_internal(store.as_ref(), "   ", "No Key").await;
    insert_internal(store.as_ref(), "A", "Alpha").await;

    let source = erp_a();
    let adapter = MockAdapter::new(source.clone()).with_record(external(&source, "A", "Alpha"));

    let mut session = running_session(&store, ScanKind::LinkScan).await;
    run(&store, &mut session, adapter).await;

    let loaded = store.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.total_scanned(), 1);
    assert_eq!(loaded.expected_total(), Some(1));
}

#[tokio::test]
async fn test_link_scan_is_idempotent() {
    let store = store().await;
    insert_internal(store.as_ref(), "A", "Alpha").await;
    insert_internal(store.as_ref(), "B", "Beta").await;

    let source = erp_a();
    let build = || {
        MockAdapter::new(source.clone())
            .with_record(external(&source, "B", "Beta"))
            .with_record(external(&source, "D", "Delta"))
    };

    let mut first = running_session(&store, ScanKind::LinkScan).await;
    run(&store, &mut first, build()).await;
    let mut second = running_session(&store, ScanKind::LinkScan).await;
    run(&store, &mut second, build()).await;

    let first = store.get_session(first.id()).await.unwrap().unwrap();
    let second = store.get_session(second.id()).await.unwrap().unwrap();
    assert_eq!(first.total_scanned(), second.total_scanned());
    assert_eq!(first.matched_count(), second.matched_count());
    assert_eq!(first.unmatched_count(), second.unmatched_count());
}

// ============================================================================
// Missing-in-internal / missing-in-external
// ============================================================================

#[tokio::test]
async fn test_missing_internal_yields_import_candidates() {
    let store = store().await;
    // Internal {A, B, C} against external {B, C, D}: only D is missing.
    insert_internal(store.as_ref(), "A", "Alpha").await;
    insert_internal(store.as_ref(), "B", "Beta").await;
    insert_internal(store.as_ref(), "C", "Gamma").await;

    let source = erp_a();
    let adapter = MockAdapter::new(source.clone())
        .with_record(external(&source, "B", "Beta"))
        .with_record(external(&source, "C", "Gamma"))
        .with_record(external(&source, "D", "Delta"));

    let mut session = running_session(&store, ScanKind::MissingInternal).await;
    run(&store, &mut session, adapter).await;

    let loaded = store.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.expected_total(), Some(1));
    assert_eq!(loaded.total_scanned(), 1);
    assert_eq!(loaded.unmatched_count(), 1);

    let page = store
        .query_results(&ResultFilter::for_session(*session.id()))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let result = &page.results[0];
    assert_eq!(result.sku(), "D");
    assert_eq!(result.name(), "Delta");
    assert_eq!(result.match_status(), MatchStatus::Unmatched);
    assert_eq!(result.external_id(), Some("ext-D"));
    assert!(result.internal_record_id().is_none());
    assert!(result.internal_snapshot().is_none());
    assert!(result.external_snapshot().is_some());
}

#[tokio::test]
async fn test_missing_external_yields_publication_candidates() {
    let store = store().await;
    // Internal {A, B, C} against external {B, C, D}: only A is missing.
    let a = insert_internal(store.as_ref(), "A", "Alpha").await;
    insert_internal(store.as_ref(), "B", "Beta").await;
    insert_internal(store.as_ref(), "C", "Gamma").await;

    // A is already published on a storefront; that link must show up in
    // the candidate's snapshot.
    let shop = SourceRef::new(
        SourceType::Storefront,
        Some(skusync_core::domain::newtypes::SourceId::new("shop-1")),
    );
    store
        .upsert_link(&SourceLink::new(a.id, shop, "shop-ext-A"))
        .await
        .unwrap();

    let source = erp_a();
    let adapter = MockAdapter::new(source.clone())
        .with_record(external(&source, "B", "Beta"))
        .with_record(external(&source, "C", "Gamma"))
        .with_record(external(&source, "D", "Delta"));

    let mut session = running_session(&store, ScanKind::MissingExternal).await;
    run(&store, &mut session, adapter).await;

    let loaded = store.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.total_scanned(), 3);
    assert_eq!(loaded.matched_count(), 2); // B and C exist externally
    assert_eq!(loaded.unmatched_count(), 1);

    let page = store
        .query_results(&ResultFilter::for_session(*session.id()))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let result = &page.results[0];
    assert_eq!(result.sku(), "A");
    assert_eq!(result.internal_record_id(), Some(&a.id));
    assert!(result.external_id().is_none());
    let snapshot = result.internal_snapshot().unwrap();
    let links = snapshot["links"].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["external_id"], "shop-ext-A");
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancellation_honored_between_batches() {
    let store = store().await;
    insert_internal(store.as_ref(), "A", "Alpha").await;
    insert_internal(store.as_ref(), "B", "Beta").await;
    insert_internal(store.as_ref(), "C", "Gamma").await;

    let source = erp_a();
    let adapter: Arc<dyn ISourceAdapter> = Arc::new(MockAdapter::new(source.clone()));

    let mut session = running_session(&store, ScanKind::LinkScan).await;
    store.request_cancel(session.id()).await.unwrap();

    let external_skus = adapter.list_skus().await.unwrap();
    let outcome = scanner(&store, 1)
        .run(&mut session, &adapter, external_skus)
        .await
        .unwrap();
    assert!(matches!(outcome, ScanOutcome::Cancelled));

    // Only the first batch made it in.
    let loaded = store.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.total_scanned(), 1);
}
