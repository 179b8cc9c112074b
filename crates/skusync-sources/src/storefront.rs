//! Storefront adapter
//!
//! Storefronts are multi-instance: each configured shop gets its own
//! adapter carrying the shop's id as the source id. Name and description
//! come back as locale maps; extraction is deterministic — the configured
//! default locale first, then the lexicographically first locale.

use std::collections::HashSet;
use std::time::Instant;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use skusync_core::config::StorefrontConfig;
use skusync_core::domain::newtypes::SourceId;
use skusync_core::domain::record::{CatalogRecord, ExternalRecord, SourceRef, SourceType};
use skusync_core::ports::source_adapter::{
    ConnectionStatus, ISourceAdapter, SourceError, SourcePage,
};

use crate::http::{build_client, expect_json, json_bool, json_f64, json_str, transport_error};
use crate::pacer::MAX_PAGES;

/// Largest page size the storefront API serves
const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Vec<serde_json::Value>,
    meta: Option<ListMeta>,
}

#[derive(Debug, Deserialize)]
struct ListMeta {
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: serde_json::Value,
}

/// Adapter for one storefront instance
pub struct StorefrontAdapter {
    source: SourceRef,
    client: Client,
    base_url: String,
    access_token: String,
    default_locale: String,
    max_pages: u32,
    cached_count: tokio::sync::Mutex<Option<u64>>,
}

impl StorefrontAdapter {
    /// Creates the adapter for one configured shop
    pub fn new(config: &StorefrontConfig) -> Result<Self, SourceError> {
        if config.base_url.trim().is_empty() {
            return Err(SourceError::Config(format!(
                "storefront '{}' has an empty base_url",
                config.id
            )));
        }
        if config.access_token.trim().is_empty() {
            return Err(SourceError::Config(format!(
                "storefront '{}' has an empty access_token",
                config.id
            )));
        }

        Ok(Self {
            source: SourceRef::new(
                SourceType::Storefront,
                Some(SourceId::new(config.id.clone())),
            ),
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            default_locale: config.default_locale.clone(),
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
            .header("X-Access-Token", &self.access_token)
    }

    /// Extracts one multilingual field deterministically
    ///
    /// Accepts either a plain string or a locale map. For maps, the
    /// configured default locale wins; otherwise the lexicographically
    /// first locale with a non-empty value.
    fn localized(&self, raw: &serde_json::Value, key: &str) -> Option<String> {
        match raw.get(key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Object(map) => {
                let non_empty = |v: &serde_json::Value| {
                    v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
                };
                if let Some(value) = map.get(&self.default_locale).and_then(non_empty) {
                    return Some(value);
                }
                let mut locales: Vec<&String> = map.keys().collect();
                locales.sort();
                locales
                    .into_iter()
                    .find_map(|locale| map.get(locale).and_then(non_empty))
            }
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl ISourceAdapter for StorefrontAdapter {
    fn source(&self) -> &SourceRef {
        &self.source
    }

    async fn list_skus(&self) -> Result<HashSet<String>, SourceError> {
        let mut skus = HashSet::new();
        let mut page = 1u32;
        loop {
            let result = self.get_page(page, MAX_PAGE_SIZE).await?;
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
            .get(&format!("/api/products/sku/{sku}"))
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
            .get("/api/products")
            .query(&[("page", page), ("limit", size)])
            .send()
            .await
            .map_err(transport_error)?;
        let body: ListResponse = expect_json(response).await?;

        let total = body.meta.and_then(|m| m.total);
        let records: Vec<ExternalRecord> =
            body.data.iter().map(|raw| self.normalize(raw)).collect();
        let has_more = match total {
            Some(total) => (page as u64) * (size as u64) < total,
            None => records.len() == size as usize,
        };

        Ok(SourcePage {
            records,
            total,
            has_more,
        })
    }

    async fn count(&self) -> Result<u64, SourceError> {
        let mut cached = self.cached_count.lock().await;
        if let Some(count) = *cached {
            return Ok(count);
        }
        // A one-item page carries the total in its meta block.
        let first = self.get_page(1, 1).await?;
        let count = match first.total {
            Some(total) => total,
            None => {
                let mut count = first.records.len() as u64;
                let mut page = 2u32;
                loop {
                    let result = self.get_page(page, MAX_PAGE_SIZE).await?;
                    count += result.records.len() as u64;
                    if !result.has_more {
                        break;
                    }
                    if page >= self.max_pages {
                        warn!(
                            source = %self.source,
                            pages = page,
                            "Page ceiling reached while counting records; total is partial"
                        );
                        break;
                    }
                    page += 1;
                }
                count
            }
        };
        *cached = Some(count);
        Ok(count)
    }

    fn normalize(&self, raw: &serde_json::Value) -> ExternalRecord {
        let external_id = json_str(raw, "id").unwrap_or_default();
        let mut record = ExternalRecord::empty(self.source.clone(), external_id);
        record.sku = json_str(raw, "sku");
        record.name = self.localized(raw, "name");
        record.description = self.localized(raw, "description");
        record.code = json_str(raw, "ean");
        record.price_net = json_f64(raw, "price_net");
        record.price_gross = json_f64(raw, "price_gross");
        record.stock = json_f64(raw, "stock");
        record.unit = json_str(raw, "unit");
        record.weight = json_f64(raw, "weight");
        record.tax_rate = json_f64(raw, "tax_rate");
        record.active = json_bool(raw, "active").unwrap_or(false);
        record.manufacturer = json_str(raw, "manufacturer");
        record.group_ref = json_str(raw, "category_id");
        record.raw = raw.clone();
        record
    }

    async fn test_connection(&self) -> ConnectionStatus {
        let started = Instant::now();
        match self
            .get("/api/products")
            .query(&[("page", 1u32), ("limit", 1u32)])
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => ConnectionStatus::ok(
                format!("storefront '{}' reachable", self.source),
                started.elapsed().as_millis() as u64,
            ),
            Ok(response) => ConnectionStatus::failed(format!(
                "storefront answered {}",
                response.status()
            )),
            Err(e) => ConnectionStatus::failed(format!("storefront unreachable: {e}")),
        }
    }

    async fn create_record(&self, record: &CatalogRecord) -> Result<String, SourceError> {
        let mut name = serde_json::Map::new();
        name.insert(self.default_locale.clone(), serde_json::json!(record.name));
        let mut description = serde_json::Map::new();
        description.insert(
            self.default_locale.clone(),
            serde_json::json!(record.description),
        );
        let payload = serde_json::json!({
            "sku": record.sku_raw,
            "name": name,
            "description": description,
            "ean": record.code,
            "price_net": record.price_net,
            "stock": record.stock,
            "unit": record.unit,
            "active": record.active,
            "manufacturer": record.manufacturer,
        });
        let response = self
            .client
            .post(format!("{}/api/products", self.base_url))
            .header("X-Access-Token", &self.access_token)
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
