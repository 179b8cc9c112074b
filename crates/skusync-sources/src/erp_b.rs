//! ERP-B adapter
//!
//! ERP-B is a token-authenticated API with offset pagination (limit capped
//! at 100) and a documented 60 requests/minute cap, enforced here by a
//! [`RequestPacer`] with at least 1.1 s between paged requests. There is no
//! count endpoint; counting enumerates the pages.

use std::collections::HashSet;
use std::time::Instant;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use skusync_core::config::ErpBConfig;
use skusync_core::domain::record::{CatalogRecord, ExternalRecord, SourceRef, SourceType};
use skusync_core::ports::source_adapter::{
    ConnectionStatus, ISourceAdapter, SourceError, SourcePage,
};

use crate::http::{build_client, expect_json, json_bool, json_f64, json_str, transport_error};
use crate::pacer::{RequestPacer, MAX_PAGES};

/// Largest limit ERP-B accepts on its listing endpoint
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: serde_json::Value,
}

/// Adapter for the ERP-B back-office API
#[derive(Debug)]
pub struct ErpBAdapter {
    source: SourceRef,
    client: Client,
    base_url: String,
    token: String,
    pacer: RequestPacer,
    max_pages: u32,
    cached_count: tokio::sync::Mutex<Option<u64>>,
}

impl ErpBAdapter {
    /// Creates the adapter, validating the configuration
    pub fn new(config: &ErpBConfig) -> Result<Self, SourceError> {
        if config.base_url.trim().is_empty() {
            return Err(SourceError::Config("erp_b.base_url is empty".to_string()));
        }
        if config.token.trim().is_empty() {
            return Err(SourceError::Config("erp_b.token is empty".to_string()));
        }

        Ok(Self {
            source: SourceRef::new(SourceType::ErpB, None),
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            pacer: RequestPacer::from_millis(config.min_request_interval_ms),
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
            .bearer_auth(&self.token)
    }

    /// Walks every page, feeding each raw item to `visit`
    ///
    /// Applies the pacer between requests and stops at the page ceiling.
    async fn enumerate<F>(&self, mut visit: F) -> Result<(), SourceError>
    where
        F: FnMut(&ExternalRecord),
    {
        let mut page = 1u32;
        loop {
            let result = self.get_page(page, MAX_LIMIT).await?;
            for record in &result.records {
                visit(record);
            }
            if !result.has_more {
                return Ok(());
            }
            if page >= self.max_pages {
                warn!(
                    source = %self.source,
                    pages = page,
                    "Page ceiling reached while enumerating; stopping"
                );
                return Ok(());
            }
            page += 1;
        }
    }
}

#[async_trait::async_trait]
impl ISourceAdapter for ErpBAdapter {
    fn source(&self) -> &SourceRef {
        &self.source
    }

    async fn list_skus(&self) -> Result<HashSet<String>, SourceError> {
        let mut skus = HashSet::new();
        self.enumerate(|record| {
            if let Some(sku) = &record.sku {
                skus.insert(sku.clone());
            }
        })
        .await?;
        debug!(source = %self.source, skus = skus.len(), "Enumerated external SKUs");
        Ok(skus)
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Option<ExternalRecord>, SourceError> {
        self.pacer.pace().await;
        let response = self
            .get(&format!("/v1/items/{sku}"))
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
        let limit = page_size.clamp(1, MAX_LIMIT);
        let offset = (page.saturating_sub(1) as u64) * limit as u64;

        self.pacer.pace().await;
        let response = self
            .get("/v1/items")
            .query(&[("offset", offset), ("limit", limit as u64)])
            .send()
            .await
            .map_err(transport_error)?;
        let items: Vec<serde_json::Value> = expect_json(response).await?;

        let has_more = items.len() == limit as usize;
        let records = items.iter().map(|raw| self.normalize(raw)).collect();

        // The listing carries no total; callers fall back to count().
        Ok(SourcePage {
            records,
            total: None,
            has_more,
        })
    }

    async fn count(&self) -> Result<u64, SourceError> {
        let mut cached = self.cached_count.lock().await;
        if let Some(count) = *cached {
            return Ok(count);
        }
        let mut count = 0u64;
        self.enumerate(|_| count += 1).await?;
        *cached = Some(count);
        Ok(count)
    }

    fn normalize(&self, raw: &serde_json::Value) -> ExternalRecord {
        let external_id = json_str(raw, "id").unwrap_or_default();
        let mut record = ExternalRecord::empty(self.source.clone(), external_id);
        record.sku = json_str(raw, "itemNumber");
        record.name = json_str(raw, "designation");
        record.description = json_str(raw, "longText");
        record.code = json_str(raw, "barcode");
        record.price_net = json_f64(raw, "netPrice");
        record.price_gross = json_f64(raw, "grossPrice");
        record.stock = json_f64(raw, "stockQuantity");
        record.unit = json_str(raw, "quantityUnit");
        record.weight = json_f64(raw, "weight");
        record.tax_rate = json_f64(raw, "taxRate");
        record.active = json_bool(raw, "isActive").unwrap_or(false);
        record.manufacturer = json_str(raw, "producer");
        record.group_ref = json_str(raw, "itemGroup");
        record.raw = raw.clone();
        record
    }

    async fn test_connection(&self) -> ConnectionStatus {
        let started = Instant::now();
        match self
            .get("/v1/items")
            .query(&[("offset", 0u64), ("limit", 1u64)])
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => ConnectionStatus::ok(
                "ERP-B reachable",
                started.elapsed().as_millis() as u64,
            ),
            Ok(response) => {
                ConnectionStatus::failed(format!("ERP-B answered {}", response.status()))
            }
            Err(e) => ConnectionStatus::failed(format!("ERP-B unreachable: {e}")),
        }
    }

    async fn create_record(&self, record: &CatalogRecord) -> Result<String, SourceError> {
        let payload = serde_json::json!({
            "itemNumber": record.sku_raw,
            "designation": record.name,
            "longText": record.description,
            "barcode": record.code,
            "netPrice": record.price_net,
            "stockQuantity": record.stock,
            "quantityUnit": record.unit,
            "isActive": record.active,
            "producer": record.manufacturer,
        });
        self.pacer.pace().await;
        let response = self
            .client
            .post(format!("{}/v1/items", self.base_url))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        let body: CreatedResponse = expect_json(response).await?;
        match &body.id {
            serde_json::Value::String(s) if !s.is_empty() => Ok(s.clone()),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            other => Err(SourceError::Decode(format!(
                "create response carried no usable id: {other}"
            ))),
        }
    }
}
