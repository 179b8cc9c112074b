//! Operator resolution of scan results
//!
//! Applies the four resolution actions to a pending scan result: link it to
//! an existing internal record, create a new internal record from an import
//! candidate, publish a publication candidate to the external source, or
//! ignore it. Every action is idempotent: a second invocation on an
//! already-resolved result is a no-op, not an error.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::domain::newtypes::{RecordId, ResultId};
use crate::domain::record::{CatalogRecord, RecordStatus, SourceLink, SourceRef};
use crate::domain::scan_result::{ResolutionStatus, ScanResult};
use crate::ports::catalog::ICatalogRepository;
use crate::ports::scan_store::IScanStore;
use crate::ports::source_adapter::ISourceAdapter;

/// Use case for resolving scan results
pub struct ResolveResultUseCase {
    scan_store: Arc<dyn IScanStore>,
    catalog: Arc<dyn ICatalogRepository>,
}

impl ResolveResultUseCase {
    /// Creates the use case with its store dependencies
    pub fn new(scan_store: Arc<dyn IScanStore>, catalog: Arc<dyn ICatalogRepository>) -> Self {
        Self { scan_store, catalog }
    }

    /// Links a result to an existing internal record
    pub async fn link(&self, result_id: &ResultId, record_id: &RecordId) -> Result<()> {
        let (result, source) = match self.load_pending(result_id, ResolutionStatus::Linked).await? {
            Some(pair) => pair,
            None => return Ok(()), // already resolved the same way
        };

        let Some(external_id) = result.external_id() else {
            bail!("result {result_id} carries no external id to link against");
        };
        let record = self
            .catalog
            .get_record(record_id)
            .await?
            .with_context(|| format!("internal record {record_id} not found"))?;

        if !record.is_linked_to(&source) {
            let link = SourceLink::new(record.id, source.clone(), external_id);
            self.catalog
                .upsert_link(&link)
                .await
                .context("Failed to persist link")?;
        }

        self.scan_store
            .update_resolution(result_id, ResolutionStatus::Linked, Some(*record_id))
            .await?;

        info!(result_id = %result_id, record_id = %record_id, source = %source, "Result linked");
        Ok(())
    }

    /// Creates a new internal draft record from an import candidate
    pub async fn create_from(&self, result_id: &ResultId) -> Result<()> {
        let (result, source) = match self
            .load_pending(result_id, ResolutionStatus::Created)
            .await?
        {
            Some(pair) => pair,
            None => return Ok(()),
        };

        let Some(snapshot) = result.external_snapshot() else {
            bail!("result {result_id} is not an import candidate (no external snapshot)");
        };
        let Some(external_id) = result.external_id() else {
            bail!("result {result_id} carries no external id");
        };

        let record = draft_from_snapshot(result.sku(), result.name(), snapshot);
        let record_id = record.id;

        self.catalog
            .insert_record(&record)
            .await
            .context("Failed to create internal record")?;
        self.catalog
            .upsert_link(&SourceLink::new(record_id, source.clone(), external_id))
            .await
            .context("Failed to persist link for created record")?;
        self.scan_store
            .update_resolution(result_id, ResolutionStatus::Created, Some(record_id))
            .await?;

        info!(result_id = %result_id, record_id = %record_id, "Import candidate created as draft");
        Ok(())
    }

    /// Creates a publication candidate on the external source
    ///
    /// The adapter is resolved by the caller for the result's source.
    pub async fn publish(
        &self,
        result_id: &ResultId,
        adapter: Arc<dyn ISourceAdapter>,
    ) -> Result<()> {
        let (result, source) = match self
            .load_pending(result_id, ResolutionStatus::Created)
            .await?
        {
            Some(pair) => pair,
            None => return Ok(()),
        };

        if *adapter.source() != source {
            bail!(
                "adapter targets {} but the result belongs to {source}",
                adapter.source()
            );
        }
        let record_id = *result
            .internal_record_id()
            .with_context(|| format!("result {result_id} has no internal record to publish"))?;
        let record = self
            .catalog
            .get_record(&record_id)
            .await?
            .with_context(|| format!("internal record {record_id} not found"))?;

        let external_id = adapter
            .create_record(&record)
            .await
            .context("Failed to create record on external source")?;

        self.catalog
            .upsert_link(&SourceLink::new(record_id, source.clone(), &external_id))
            .await
            .context("Failed to persist link for published record")?;
        self.scan_store
            .update_resolution(result_id, ResolutionStatus::Created, Some(record_id))
            .await?;

        info!(
            result_id = %result_id,
            record_id = %record_id,
            external_id = %external_id,
            "Publication candidate created on source"
        );
        Ok(())
    }

    /// Dismisses a result without acting on it
    pub async fn ignore(&self, result_id: &ResultId) -> Result<()> {
        if self
            .load_pending(result_id, ResolutionStatus::Ignored)
            .await?
            .is_none()
        {
            return Ok(());
        }
        self.scan_store
            .update_resolution(result_id, ResolutionStatus::Ignored, None)
            .await?;
        info!(result_id = %result_id, "Result ignored");
        Ok(())
    }

    /// Loads a result and its session's source, screening resolution state
    ///
    /// Returns `None` when the result is already resolved with `target`
    /// (idempotent no-op); errors when it is resolved with a different
    /// outcome or does not exist.
    async fn load_pending(
        &self,
        result_id: &ResultId,
        target: ResolutionStatus,
    ) -> Result<Option<(ScanResult, SourceRef)>> {
        let result = self
            .scan_store
            .get_result(result_id)
            .await?
            .with_context(|| format!("scan result {result_id} not found"))?;

        if result.resolution_status() == target {
            warn!(result_id = %result_id, status = %target, "Result already resolved, no-op");
            return Ok(None);
        }
        if result.resolution_status().is_resolved() {
            bail!(
                "result {result_id} is already resolved as {}",
                result.resolution_status()
            );
        }

        let session = self
            .scan_store
            .get_session(result.session_id())
            .await?
            .with_context(|| format!("session {} not found", result.session_id()))?;
        let source = session.source().clone();

        Ok(Some((result, source)))
    }
}

/// Builds a draft internal record from an external snapshot
fn draft_from_snapshot(sku: &str, name: &str, snapshot: &serde_json::Value) -> CatalogRecord {
    let str_field = |key: &str| {
        snapshot
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let num_field = |key: &str| snapshot.get(key).and_then(|v| v.as_f64());

    CatalogRecord {
        id: RecordId::new(),
        sku_raw: sku.to_string(),
        name: name.to_string(),
        code: str_field("code"),
        description: str_field("description"),
        manufacturer: str_field("manufacturer"),
        price_net: num_field("price_net"),
        stock: num_field("stock"),
        unit: str_field("unit"),
        active: false,
        status: RecordStatus::Draft,
        links: Vec::new(),
    }
}
