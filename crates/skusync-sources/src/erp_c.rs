//! ERP-C placeholder adapter
//!
//! The ERP-C integration is planned but not built. The adapter constructs
//! fine so the source stays selectable, and every data operation returns a
//! structured [`SourceError::NotImplemented`] (status 501) naming the
//! missing prerequisites. The connection test reports failure without
//! erroring, matching the port contract.

use std::collections::HashSet;

use skusync_core::domain::record::{CatalogRecord, ExternalRecord, SourceRef, SourceType};
use skusync_core::ports::source_adapter::{
    ConnectionStatus, ISourceAdapter, SourceError, SourcePage,
};

/// Adapter placeholder for the unintegrated ERP-C system
pub struct ErpCAdapter {
    source: SourceRef,
}

impl ErpCAdapter {
    /// Creates the placeholder adapter
    pub fn new() -> Self {
        Self {
            source: SourceRef::new(SourceType::ErpC, None),
        }
    }

    fn not_implemented() -> SourceError {
        SourceError::NotImplemented {
            status: 501,
            missing: vec![
                "api_endpoint_mapping".to_string(),
                "credential_provisioning".to_string(),
            ],
        }
    }
}

impl Default for ErpCAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ISourceAdapter for ErpCAdapter {
    fn source(&self) -> &SourceRef {
        &self.source
    }

    async fn list_skus(&self) -> Result<HashSet<String>, SourceError> {
        Err(Self::not_implemented())
    }

    async fn get_by_sku(&self, _sku: &str) -> Result<Option<ExternalRecord>, SourceError> {
        Err(Self::not_implemented())
    }

    async fn get_page(&self, _page: u32, _page_size: u32) -> Result<SourcePage, SourceError> {
        Err(Self::not_implemented())
    }

    async fn count(&self) -> Result<u64, SourceError> {
        Err(Self::not_implemented())
    }

    fn normalize(&self, raw: &serde_json::Value) -> ExternalRecord {
        let mut record = ExternalRecord::empty(self.source.clone(), String::new());
        record.raw = raw.clone();
        record
    }

    async fn test_connection(&self) -> ConnectionStatus {
        ConnectionStatus::failed("ERP-C integration is not implemented")
    }

    async fn create_record(&self, _record: &CatalogRecord) -> Result<String, SourceError> {
        Err(Self::not_implemented())
    }
}
