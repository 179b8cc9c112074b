//! ERP-A adapter
//!
//! ERP-A exposes a conventional REST API with page-number pagination (page
//! sizes up to 250), key/secret header authentication and a native count
//! endpoint. Its payloads are flat JSON objects.

use std::collections::HashSet;
use std::time::Instant;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use skusync_core::config::ErpAConfig;
use skusync_core::domain::record::{CatalogRecord, ExternalRecord, SourceRef, SourceType};
use skusync_core::ports::source_adapter::{
    ConnectionStatus, ISourceAdapter, SourceError, SourcePage,
};

use crate::http::{build_client, expect_json, json_bool, json_f64, json_str, transport_error};
use crate::pacer::MAX_PAGES;

/// Largest page size ERP-A serves; bigger requests are truncated server-side
const MAX_PAGE_SIZE: u32 = 250;

/// Page size used for full enumerations
const ENUMERATION_PAGE_SIZE: u32 = 250;

#[derive(Debug, Deserialize)]
struct ListResponse {
    items: Vec<serde_json::Value>,
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: serde_json::Value,
}

/// Adapter for the ERP-A back-office API
#[derive(Debug)]
pub struct ErpAAdapter {
    source: SourceRef,
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    max_pages: u32,
    cached_count: tokio::sync::Mutex<Option<u64>>,
}

impl ErpAAdapter {
    /// Creates the adapter, validating the configuration
    pub fn new(config: &ErpAConfig) -> Result<Self, SourceError> {
        if config.base_url.trim().is_empty() {
            return Err(SourceError::Config("erp_a.base_url is empty".to_string()));
        }
        if config.api_key.trim().is_empty() || config.api_secret.trim().is_empty() {
            return Err(SourceError::Config(
                "erp_a needs api_key and api_secret".to_string(),
            ));
        }

        Ok(Self {
            source: SourceRef::new(SourceType::ErpA, None),
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            max_pages: MAX_PAGES,
            cached_count: tokio::sync::Mutex::new(None),
        })
    }

    /// Overrides the pagination safety ceiling
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .header("X-Api-Secret", &self.api_secret)
    }
}

#[async_trait::async_trait]
impl ISourceAdapter for ErpAAdapter {
    fn source(&self) -> &SourceRef {
        &self.source
    }

    async fn list_skus(&self) -> Result<HashSet<String>, SourceError> {
        let mut skus = HashSet::new();
        let mut page = 1u32;
        loop {
            let result = self.get_page(page, ENUMERATION_PAGE_SIZE).await?;
            for record in &result.records {
                if let Some(sku) = &record.sku {
                    skus.insert(sku.clone());
                }
            }
            if !result.has_more {
                break;
            }
            if page >= self.max_pages {
                warn!(
                    source = %self.source,
                    pages = page,
                    "Page ceiling reached while enumerating SKUs; stopping"
                );
                break;
            }
            page += 1;
        }
        debug!(source = %self.source, skus = skus.len(), "Enumerated external SKUs");
        Ok(skus)
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Option<ExternalRecord>, SourceError> {
        let response = self
            .get(&format!("/api/v2/products/sku/{sku}"))
            .send()
            .await
            .map_err(transport_error)?;
        match expect_json::<serde_json::Value>(response).await {
            Ok(raw) => Ok(Some(self.normalize(&raw))),
            Err(SourceError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_page(&self, page: u32, page_size: u32) -> Result<SourcePage, SourceError> {
        let size = page_size.clamp(1, MAX_PAGE_SIZE);
        let response = self
            .get("/api/v2/products")
            .query(&[("page", page), ("per_page", size)])
            .send()
            .await
            .map_err(transport_error)?;
        let body: ListResponse = expect_json(response).await?;

        let records: Vec<ExternalRecord> =
            body.items.iter().map(|raw| self.normalize(raw)).collect();
        let has_more = match body.total {
            Some(total) => (page as u64) * (size as u64) < total,
            None => records.len() == size as usize,
        };

        Ok(SourcePage {
            records,
            total: body.total,
            has_more,
        })
    }

    async fn count(&self) -> Result<u64, SourceError> {
        let mut cached = self.cached_count.lock().await;
        if let Some(count) = *cached {
            return Ok(count);
        }
        let response = self
            .get("/api/v2/products/count")
            .send()
            .await
            .map_err(transport_error)?;
        let body: CountResponse = expect_json(response).await?;
        *cached = Some(body.count);
        Ok(body.count)
    }

    fn normalize(&self, raw: &serde_json::Value) -> ExternalRecord {
        let external_id = json_str(raw, "id").unwrap_or_default();
        let mut record = ExternalRecord::empty(self.source.clone(), external_id);
        record.sku = json_str(raw, "sku");
        record.name = json_str(raw, "name");
        record.description = json_str(raw, "description");
        record.code = json_str(raw, "ean");
        record.price_net = json_f64(raw, "price_net");
        record.price_gross = json_f64(raw, "price_gross");
        record.stock = json_f64(raw, "stock");
        record.unit = json_str(raw, "unit");
        record.weight = json_f64(raw, "weight");
        record.tax_rate = json_f64(raw, "vat_rate");
        record.active = json_bool(raw, "active").unwrap_or(false);
        record.manufacturer = json_str(raw, "manufacturer");
        record.group_ref = json_str(raw, "product_group");
        record.raw = raw.clone();
        record
    }

    async fn test_connection(&self) -> ConnectionStatus {
        let started = Instant::now();
        match self.get("/api/v2/products/count").send().await {
            Ok(response) if response.status().is_success() => ConnectionStatus::ok(
                "ERP-A reachable",
                started.elapsed().as_millis() as u64,
            ),
            Ok(response) => {
                ConnectionStatus::failed(format!("ERP-A answered {}", response.status()))
            }
            Err(e) => ConnectionStatus::failed(format!("ERP-A unreachable: {e}")),
        }
    }

    async fn create_record(&self, record: &CatalogRecord) -> Result<String, SourceError> {
        let payload = serde_json::json!({
            "sku": record.sku_raw,
            "name": record.name,
            "description": record.description,
            "ean": record.code,
            "price_net": record.price_net,
            "stock": record.stock,
            "unit": record.unit,
            "active": record.active,
            "manufacturer": record.manufacturer,
        });
        let response = self
            .client
            .post(format!("{}/api/v2/products", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .header("X-Api-Secret", &self.api_secret)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        let body: CreatedResponse = expect_json(response).await?;
        json_value_to_id(&body.id)
    }
}

/// Accepts both numeric and string ids from create responses
fn json_value_to_id(value: &serde_json::Value) -> Result<String, SourceError> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(SourceError::Decode(format!(
            "create response carried no usable id: {other}"
        ))),
    }
}
