//! Resolution action tests: link, create, publish, ignore, idempotence

use std::sync::Arc;

use skusync_core::domain::newtypes::ResultId;
use skusync_core::domain::record::RecordStatus;
use skusync_core::domain::scan_result::{MatchStatus, ResolutionStatus, ScanResult};
use skusync_core::domain::session::{ScanKind, ScanSession};
use skusync_core::ports::catalog::ICatalogRepository;
use skusync_core::ports::scan_store::IScanStore;
use skusync_core::ports::source_adapter::ISourceAdapter;
use skusync_core::usecases::ResolveResultUseCase;
use skusync_store::SqliteStore;

use crate::common::{erp_a, insert_internal, store, MockAdapter};

fn usecase(store: &Arc<SqliteStore>) -> ResolveResultUseCase {
    ResolveResultUseCase::new(store.clone(), store.clone())
}

async fn session(store: &Arc<SqliteStore>) -> ScanSession {
    let session = ScanSession::new(erp_a(), ScanKind::LinkScan);
    store.create_session(&session).await.unwrap();
    session
}

/// Inserts an import candidate (external side only) and returns its id
async fn import_candidate(store: &Arc<SqliteStore>, session: &ScanSession) -> ResultId {
    let result = ScanResult::new(
        *session.id(),
        "A",
        "Alpha",
        Some("ext-A".to_string()),
        None,
        MatchStatus::Unmatched,
        None,
        Some(serde_json::json!({
            "external_id": "ext-A",
            "sku": "A",
            "name": "Alpha",
            "code": "4006381333931",
            "price_net": 19.99,
        })),
        None,
    )
    .unwrap();
    let id = *result.id();
    store.insert_results(&[result]).await.unwrap();
    id
}

#[tokio::test]
async fn test_link_attaches_result_to_existing_record() {
    let store = store().await;
    let session = session(&store).await;
    let record = insert_internal(store.as_ref(), "A", "Alpha").await;
    let result_id = import_candidate(&store, &session).await;

    usecase(&store).link(&result_id, &record.id).await.unwrap();

    let result = store.get_result(&result_id).await.unwrap().unwrap();
    assert_eq!(result.resolution_status(), ResolutionStatus::Linked);
    assert_eq!(result.internal_record_id(), Some(&record.id));

    let reloaded = store.get_record(&record.id).await.unwrap().unwrap();
    let link = reloaded.link_for(&erp_a()).unwrap();
    assert_eq!(link.external_id, "ext-A");
}

#[tokio::test]
async fn test_double_resolution_is_a_no_op() {
    let store = store().await;
    let session = session(&store).await;
    let record = insert_internal(store.as_ref(), "A", "Alpha").await;
    let result_id = import_candidate(&store, &session).await;

    let usecase = usecase(&store);
    usecase.link(&result_id, &record.id).await.unwrap();
    // Same action again: accepted without effect.
    usecase.link(&result_id, &record.id).await.unwrap();

    let result = store.get_result(&result_id).await.unwrap().unwrap();
    assert_eq!(result.resolution_status(), ResolutionStatus::Linked);
    let reloaded = store.get_record(&record.id).await.unwrap().unwrap();
    assert_eq!(reloaded.links.len(), 1);
}

#[tokio::test]
async fn test_conflicting_re_resolution_is_rejected() {
    let store = store().await;
    let session = session(&store).await;
    let record = insert_internal(store.as_ref(), "A", "Alpha").await;
    let result_id = import_candidate(&store, &session).await;

    let usecase = usecase(&store);
    usecase.link(&result_id, &record.id).await.unwrap();

    let err = usecase.ignore(&result_id).await.unwrap_err();
    assert!(err.to_string().contains("already resolved"));

    let result = store.get_result(&result_id).await.unwrap().unwrap();
    assert_eq!(result.resolution_status(), ResolutionStatus::Linked);
}

#[tokio::test]
async fn test_create_from_builds_a_linked_draft() {
    let store = store().await;
    let session = session(&store).await;
    let result_id = import_candidate(&store, &session).await;

    usecase(&store).create_from(&result_id).await.unwrap();

    let result = store.get_result(&result_id).await.unwrap().unwrap();
    assert_eq!(result.resolution_status(), ResolutionStatus::Created);
    let record_id = result.internal_record_id().unwrap();

    let record = store.get_record(record_id).await.unwrap().unwrap();
    assert_eq!(record.sku_raw, "A");
    assert_eq!(record.name, "Alpha");
    assert_eq!(record.code.as_deref(), Some("4006381333931"));
    assert_eq!(record.price_net, Some(19.99));
    assert_eq!(record.status, RecordStatus::Draft);
    assert!(!record.active);
    assert_eq!(record.link_for(&erp_a()).unwrap().external_id, "ext-A");
}

#[tokio::test]
async fn test_publish_creates_the_record_on_the_source() {
    let store = store().await;
    let session = session(&store).await;
    let record = insert_internal(store.as_ref(), "A", "Alpha").await;

    // A publication candidate carries the internal side only.
    let result = ScanResult::new(
        *session.id(),
        "A",
        "Alpha",
        None,
        Some(record.id),
        MatchStatus::Unmatched,
        Some(record.snapshot()),
        None,
        None,
    )
    .unwrap();
    let result_id = *result.id();
    store.insert_results(&[result]).await.unwrap();

    let adapter: Arc<dyn ISourceAdapter> = Arc::new(MockAdapter::new(erp_a()));
    usecase(&store).publish(&result_id, adapter).await.unwrap();

    let resolved = store.get_result(&result_id).await.unwrap().unwrap();
    assert_eq!(resolved.resolution_status(), ResolutionStatus::Created);

    let reloaded = store.get_record(&record.id).await.unwrap().unwrap();
    assert_eq!(reloaded.link_for(&erp_a()).unwrap().external_id, "pub-A");
}

#[tokio::test]
async fn test_ignore_dismisses_without_side_effects() {
    let store = store().await;
    let session = session(&store).await;
    let result_id = import_candidate(&store, &session).await;

    usecase(&store).ignore(&result_id).await.unwrap();

    let result = store.get_result(&result_id).await.unwrap().unwrap();
    assert_eq!(result.resolution_status(), ResolutionStatus::Ignored);
    assert!(result.internal_record_id().is_none());
    assert!(store.list_records().await.unwrap().is_empty());
}
