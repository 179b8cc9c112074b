//! Shared fixtures: in-memory store and a deterministic mock source

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use skusync_core::domain::newtypes::RecordId;
use skusync_core::domain::record::{
    CatalogRecord, ExternalRecord, RecordStatus, SourceRef, SourceType,
};
use skusync_core::ports::catalog::ICatalogRepository;
use skusync_core::ports::source_adapter::{
    ConnectionStatus, ISourceAdapter, SourceError, SourcePage,
};
use skusync_store::{DatabasePool, SqliteStore};

/// The single-instance source all fixtures default to
pub fn erp_a() -> SourceRef {
    SourceRef::new(SourceType::ErpA, None)
}

pub async fn store() -> Arc<SqliteStore> {
    let pool = DatabasePool::in_memory().await.unwrap();
    Arc::new(SqliteStore::new(pool.pool().clone()))
}

/// Builds a normalized external record for the mock source
pub fn external(source: &SourceRef, sku: &str, name: &str) -> ExternalRecord {
    let mut record = ExternalRecord::empty(source.clone(), format!("ext-{sku}"));
    record.sku = Some(sku.to_string());
    record.name = Some(name.to_string());
    record.active = true;
    record.raw = serde_json::json!({"sku": sku, "name": name});
    record
}

/// Builds an internal catalog record
pub fn internal(sku: &str, name: &str) -> CatalogRecord {
    CatalogRecord {
        id: RecordId::new(),
        sku_raw: sku.to_string(),
        name: name.to_string(),
        code: None,
        description: None,
        manufacturer: None,
        price_net: None,
        stock: None,
        unit: None,
        active: true,
        status: RecordStatus::Active,
        links: Vec::new(),
    }
}

/// Inserts an internal record and returns it
pub async fn insert_internal(catalog: &dyn ICatalogRepository, sku: &str, name: &str) -> CatalogRecord {
    let record = internal(sku, name);
    catalog.insert_record(&record).await.unwrap();
    record
}

// ============================================================================
// MockAdapter
// ============================================================================

/// In-memory source adapter with injectable failures
pub struct MockAdapter {
    source: SourceRef,
    records: HashMap<String, ExternalRecord>,
    fail_skus: HashSet<String>,
    list_failures: AtomicU32,
    list_delay: Duration,
}

impl MockAdapter {
    pub fn new(source: SourceRef) -> Self {
        Self {
            source,
            records: HashMap::new(),
            fail_skus: HashSet::new(),
            list_failures: AtomicU32::new(0),
            list_delay: Duration::ZERO,
        }
    }

    /// Adds a record, keyed by its SKU
    pub fn with_record(mut self, record: ExternalRecord) -> Self {
        if let Some(sku) = record.sku.clone() {
            self.records.insert(sku, record);
        }
        self
    }

    /// Makes detail fetches for this SKU fail transiently
    pub fn failing_sku(mut self, sku: &str) -> Self {
        self.fail_skus.insert(sku.to_string());
        self
    }

    /// Makes the next `n` listing calls fail transiently
    pub fn with_list_failures(self, n: u32) -> Self {
        self.list_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Delays every listing call (for timeout tests)
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl ISourceAdapter for MockAdapter {
    fn source(&self) -> &SourceRef {
        &self.source
    }

    async fn list_skus(&self) -> Result<HashSet<String>, SourceError> {
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        if self.list_failures.load(Ordering::SeqCst) > 0 {
            self.list_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(SourceError::Transient {
                status: Some(503),
                message: "listing unavailable".to_string(),
            });
        }
        Ok(self.records.keys().cloned().collect())
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Option<ExternalRecord>, SourceError> {
        if self.fail_skus.contains(sku) {
            return Err(SourceError::Transient {
                status: Some(503),
                message: "detail fetch unavailable".to_string(),
            });
        }
        Ok(self.records.get(sku).cloned())
    }

    async fn get_page(&self, page: u32, page_size: u32) -> Result<SourcePage, SourceError> {
        let mut skus: Vec<&String> = self.records.keys().collect();
        skus.sort();
        let start = ((page.max(1) - 1) * page_size) as usize;
        let records: Vec<ExternalRecord> = skus
            .iter()
            .skip(start)
            .take(page_size as usize)
            .map(|sku| self.records[*sku].clone())
            .collect();
        let total = self.records.len() as u64;
        let has_more = (start + records.len()) < self.records.len();
        Ok(SourcePage {
            records,
            total: Some(total),
            has_more,
        })
    }

    async fn count(&self) -> Result<u64, SourceError> {
        Ok(self.records.len() as u64)
    }

    fn normalize(&self, raw: &serde_json::Value) -> ExternalRecord {
        let mut record = ExternalRecord::empty(self.source.clone(), "mock");
        record.raw = raw.clone();
        record
    }

    async fn test_connection(&self) -> ConnectionStatus {
        ConnectionStatus::ok("mock source reachable", 0)
    }

    async fn create_record(&self, record: &CatalogRecord) -> Result<String, SourceError> {
        Ok(format!("pub-{}", record.sku_raw))
    }
}
