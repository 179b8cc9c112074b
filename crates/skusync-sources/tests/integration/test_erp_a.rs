//! ERP-A adapter integration tests

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skusync_core::ports::source_adapter::{ISourceAdapter, SourceError};

use crate::common;

#[tokio::test]
async fn test_list_skus_pages_through_and_deduplicates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/products"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                common::erp_a_product(1, "SKU-A"),
                common::erp_a_product(2, "SKU-B"),
            ],
            // More than one enumeration page (250), so page 2 gets fetched.
            "total": 260
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                // Duplicate of page 1 plus one new key.
                common::erp_a_product(2, "SKU-B"),
                common::erp_a_product(3, "SKU-C"),
            ],
            "total": 260
        })))
        .mount(&server)
        .await;

    let adapter = common::erp_a_adapter(&server);
    let skus = adapter.list_skus().await.unwrap();

    assert_eq!(skus.len(), 3);
    assert!(skus.contains("SKU-A"));
    assert!(skus.contains("SKU-B"));
    assert!(skus.contains("SKU-C"));
}

#[tokio::test]
async fn test_requests_carry_key_and_secret_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/products/count"))
        .and(header("X-Api-Key", "test-key"))
        .and(header("X-Api-Secret", "test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = common::erp_a_adapter(&server);
    assert_eq!(adapter.count().await.unwrap(), 42);
    // A second call hits the per-instance cache, not the server.
    assert_eq!(adapter.count().await.unwrap(), 42);
}

#[tokio::test]
async fn test_get_by_sku_maps_404_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/products/sku/SKU-MISSING"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = common::erp_a_adapter(&server);
    let found = adapter.get_by_sku("SKU-MISSING").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_server_errors_classify_as_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/products"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let adapter = common::erp_a_adapter(&server);
    let err = adapter.get_page(1, 50).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_auth_errors_are_not_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/products"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let adapter = common::erp_a_adapter(&server);
    let err = adapter.get_page(1, 50).await.unwrap_err();
    assert!(matches!(err, SourceError::Api { status: Some(401), .. }));
}

#[tokio::test]
async fn test_page_ceiling_terminates_enumeration() {
    let server = MockServer::start().await;

    // Every page claims more follow; without the ceiling this would never stop.
    Mock::given(method("GET"))
        .and(path("/api/v2/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": (0..250u64).map(|i| common::erp_a_product(i, &format!("SKU-{i}")))
                .collect::<Vec<_>>(),
            "total": 10_000_000
        })))
        .mount(&server)
        .await;

    let adapter = common::erp_a_adapter(&server).with_max_pages(3);
    let skus = adapter.list_skus().await.unwrap();

    // 3 pages of the same 250 keys.
    assert_eq!(skus.len(), 250);
}

#[tokio::test]
async fn test_create_record_returns_new_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/products"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 999})))
        .mount(&server)
        .await;

    let adapter = common::erp_a_adapter(&server);
    let record = skusync_core::domain::record::CatalogRecord {
        id: skusync_core::domain::newtypes::RecordId::new(),
        sku_raw: "SKU-NEW".to_string(),
        name: "New product".to_string(),
        code: None,
        description: None,
        manufacturer: None,
        price_net: Some(1.0),
        stock: None,
        unit: None,
        active: true,
        status: skusync_core::domain::record::RecordStatus::Active,
        links: Vec::new(),
    };

    let external_id = adapter.create_record(&record).await.unwrap();
    assert_eq!(external_id, "999");
}

#[tokio::test]
async fn test_connection_check_reports_failure_without_erroring() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/products/count"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = common::erp_a_adapter(&server);
    let status = adapter.test_connection().await;
    assert!(!status.success);
}
