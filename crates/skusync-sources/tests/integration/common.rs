//! Shared test helpers for the adapter integration tests

use wiremock::MockServer;

use skusync_core::config::{ErpAConfig, ErpBConfig, StorefrontConfig};
use skusync_sources::erp_a::ErpAAdapter;
use skusync_sources::erp_b::ErpBAdapter;
use skusync_sources::storefront::StorefrontAdapter;

/// ERP-A adapter pointed at a mock server
pub fn erp_a_adapter(server: &MockServer) -> ErpAAdapter {
    ErpAAdapter::new(&ErpAConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        api_secret: "test-secret".to_string(),
        timeout_secs: 5,
    })
    .expect("adapter construction")
}

/// ERP-B adapter pointed at a mock server, with the pacer effectively off
/// so tests are not slowed to the production request interval
pub fn erp_b_adapter(server: &MockServer) -> ErpBAdapter {
    ErpBAdapter::new(&ErpBConfig {
        base_url: server.uri(),
        token: "test-token".to_string(),
        timeout_secs: 5,
        min_request_interval_ms: 0,
    })
    .expect("adapter construction")
}

/// Storefront adapter pointed at a mock server
pub fn storefront_adapter(server: &MockServer, default_locale: &str) -> StorefrontAdapter {
    StorefrontAdapter::new(&StorefrontConfig {
        id: "shop-1".to_string(),
        base_url: server.uri(),
        access_token: "test-token".to_string(),
        default_locale: default_locale.to_string(),
        timeout_secs: 5,
    })
    .expect("adapter construction")
}

/// A flat ERP-A product payload
pub fn erp_a_product(id: u64, sku: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "sku": sku,
        "name": format!("Product {sku}"),
        "ean": "4006381333931",
        "price_net": 10.0,
        "stock": 5,
        "active": true,
    })
}

/// A camelCase ERP-B item payload
pub fn erp_b_item(id: &str, sku: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "itemNumber": sku,
        "designation": format!("Item {sku}"),
        "netPrice": 4.5,
        "stockQuantity": 20,
        "isActive": true,
    })
}
