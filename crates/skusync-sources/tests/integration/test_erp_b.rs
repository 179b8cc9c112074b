//! ERP-B adapter integration tests

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skusync_core::ports::source_adapter::ISourceAdapter;

use crate::common;

#[tokio::test]
async fn test_offset_pagination_with_limit_clamped_to_100() {
    let server = MockServer::start().await;

    // Requested 500 per page; the adapter must clamp to the API maximum.
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            common::erp_b_item("b-1", "SKU-1"),
            common::erp_b_item("b-2", "SKU-2"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = common::erp_b_adapter(&server);
    let page = adapter.get_page(1, 500).await.unwrap();

    assert_eq!(page.records.len(), 2);
    assert!(page.total.is_none());
    // A short page means the listing is exhausted.
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/items/SKU-1"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::erp_b_item("b-1", "SKU-1")),
        )
        .mount(&server)
        .await;

    let adapter = common::erp_b_adapter(&server);
    let record = adapter.get_by_sku("SKU-1").await.unwrap().unwrap();
    assert_eq!(record.external_id, "b-1");
    assert_eq!(record.sku.as_deref(), Some("SKU-1"));
}

#[tokio::test]
async fn test_get_by_sku_maps_404_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/items/SKU-GONE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = common::erp_b_adapter(&server);
    assert!(adapter.get_by_sku("SKU-GONE").await.unwrap().is_none());
}

#[tokio::test]
async fn test_count_enumerates_pages() {
    let server = MockServer::start().await;

    // Full first page, partial second page: count = 100 + 7.
    let full: Vec<serde_json::Value> = (0..100)
        .map(|i| common::erp_b_item(&format!("b-{i}"), &format!("SKU-{i}")))
        .collect();
    let partial: Vec<serde_json::Value> = (100..107)
        .map(|i| common::erp_b_item(&format!("b-{i}"), &format!("SKU-{i}")))
        .collect();

    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(full)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(partial)))
        .mount(&server)
        .await;

    let adapter = common::erp_b_adapter(&server);
    assert_eq!(adapter.count().await.unwrap(), 107);
    // Cached on the second call.
    assert_eq!(adapter.count().await.unwrap(), 107);
}

#[tokio::test]
async fn test_page_ceiling_terminates_enumeration() {
    let server = MockServer::start().await;

    // Always-full pages: termination relies on the ceiling.
    let full: Vec<serde_json::Value> = (0..100)
        .map(|i| common::erp_b_item(&format!("b-{i}"), &format!("SKU-{i}")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(full)))
        .mount(&server)
        .await;

    let adapter = common::erp_b_adapter(&server).with_max_pages(2);
    assert_eq!(adapter.count().await.unwrap(), 200);
}
