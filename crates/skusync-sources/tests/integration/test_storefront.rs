//! Storefront adapter integration tests

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skusync_core::ports::source_adapter::ISourceAdapter;

use crate::common;

fn product(id: &str, sku: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "sku": sku,
        "name": { "de": "Schraube", "en": "Screw" },
        "description": { "de": "Eine Schraube" },
        "price_net": 0.12,
        "active": true,
    })
}

#[tokio::test]
async fn test_multilingual_name_uses_default_locale() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(header("X-Access-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [product("p-1", "SKU-1")],
            "meta": { "total": 1 }
        })))
        .mount(&server)
        .await;

    let adapter = common::storefront_adapter(&server, "en");
    let page = adapter.get_page(1, 50).await.unwrap();

    let record = &page.records[0];
    assert_eq!(record.name.as_deref(), Some("Screw"));
    // "en" description missing: lexicographically first locale wins.
    assert_eq!(record.description.as_deref(), Some("Eine Schraube"));
    assert_eq!(page.total, Some(1));
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_count_reads_meta_total_from_one_item_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [product("p-1", "SKU-1")],
            "meta": { "total": 1234 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = common::storefront_adapter(&server, "en");
    assert_eq!(adapter.count().await.unwrap(), 1234);
    assert_eq!(adapter.count().await.unwrap(), 1234);
}

#[tokio::test]
async fn test_count_fallback_stops_at_page_ceiling() {
    let server = MockServer::start().await;

    // No meta total anywhere, and every full page implies more follow,
    // so the fallback enumeration can only stop at the ceiling.
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [product("p-0", "SKU-0")]
        })))
        .mount(&server)
        .await;
    let full: Vec<serde_json::Value> = (0..200)
        .map(|i| product(&format!("p-{i}"), &format!("SKU-{i}")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("limit", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": full
        })))
        .mount(&server)
        .await;

    let adapter = common::storefront_adapter(&server, "en").with_max_pages(3);
    // One-item first page plus fallback pages 2 and 3, then the ceiling ends it.
    assert_eq!(adapter.count().await.unwrap(), 401);
}

#[tokio::test]
async fn test_get_by_sku_maps_404_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products/sku/SKU-GONE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = common::storefront_adapter(&server, "en");
    assert!(adapter.get_by_sku("SKU-GONE").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_skus_pages_until_total_reached() {
    let server = MockServer::start().await;

    // 200 per enumeration page, total 201: exactly two pages.
    let page1: Vec<serde_json::Value> = (0..200)
        .map(|i| product(&format!("p-{i}"), &format!("SKU-{i}")))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": page1,
            "meta": { "total": 201 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [product("p-200", "SKU-200")],
            "meta": { "total": 201 }
        })))
        .mount(&server)
        .await;

    let adapter = common::storefront_adapter(&server, "en");
    let skus = adapter.list_skus().await.unwrap();
    assert_eq!(skus.len(), 201);
}
