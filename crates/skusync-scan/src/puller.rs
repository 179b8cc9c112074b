//! Pull synchronizer for already-linked records
//!
//! Re-fetches every record linked to one source and applies the configured
//! conflict policy per record:
//!
//! - not found upstream → the record was deleted there: clear the link
//!   (handled, counted, never fatal);
//! - policy says update → apply the field writes and mark the link synced
//!   (clearing any recorded conflicts) in that order;
//! - policy says conflict → persist the conflicts on the link with a
//!   detection timestamp.
//!
//! Records are processed sequentially; per-source request pacing lives in
//! the adapter itself.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use skusync_conflict::decide;
use skusync_core::domain::conflict::ConflictPolicy;
use skusync_core::ports::catalog::ICatalogRepository;
use skusync_core::ports::source_adapter::ISourceAdapter;

/// Counters for one pull run, shaped for display
#[derive(Debug, Clone, Default, Serialize)]
pub struct PullSummary {
    /// Linked records examined
    pub checked: u64,
    /// Records whose fields were updated from the source
    pub updated: u64,
    /// Records left untouched with conflicts recorded on the link
    pub conflicted: u64,
    /// Links cleared because the record vanished upstream
    pub unlinked: u64,
    /// Records skipped due to fetch or persistence failures
    pub errors: u64,
}

/// Synchronizes linked records from one source into the catalog
pub struct PullSynchronizer {
    catalog: Arc<dyn ICatalogRepository>,
    policy: ConflictPolicy,
}

impl PullSynchronizer {
    /// Creates a synchronizer applying the given conflict policy
    pub fn new(catalog: Arc<dyn ICatalogRepository>, policy: ConflictPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Pulls every record linked to the adapter's source
    pub async fn pull(&self, adapter: &Arc<dyn ISourceAdapter>) -> Result<PullSummary> {
        let source = adapter.source().clone();
        let records = self
            .catalog
            .list_linked_records(&source)
            .await
            .context("Failed to enumerate linked records")?;

        info!(
            source = %source,
            linked = records.len(),
            policy = %self.policy,
            "Pull starting"
        );

        let mut summary = PullSummary::default();
        for record in records {
            summary.checked += 1;

            let Some(sku) = record.sku() else {
                warn!(record_id = %record.id, "Linked record has a blank SKU, skipping");
                summary.errors += 1;
                continue;
            };
            let Some(link) = record.link_for(&source) else {
                // list_linked_records guarantees a link row; tolerate a race.
                summary.errors += 1;
                continue;
            };
            let mut link = link.clone();

            let external = match adapter.get_by_sku(sku.as_str()).await {
                Ok(Some(external)) => external,
                Ok(None) => {
                    info!(sku = %sku, source = %source, "Record deleted upstream, clearing link");
                    match self.catalog.clear_link(&record.id, &source).await {
                        Ok(()) => summary.unlinked += 1,
                        Err(err) => {
                            warn!(sku = %sku, error = %err, "Failed to clear link");
                            summary.errors += 1;
                        }
                    }
                    continue;
                }
                Err(err) => {
                    warn!(sku = %sku, source = %source, error = %err, "Fetch failed, skipping record");
                    summary.errors += 1;
                    continue;
                }
            };

            let decision = decide(self.policy, &record, &external);
            debug!(sku = %sku, reason = %decision.reason, "Policy decided");

            if decision.should_update {
                if let Err(err) = self.apply_update(&record.id, &decision.update).await {
                    warn!(sku = %sku, error = %err, "Failed to apply update");
                    summary.errors += 1;
                    continue;
                }
                if !decision.update.is_empty() {
                    summary.updated += 1;
                }
                link.mark_synced();
                if let Err(err) = self.catalog.upsert_link(&link).await {
                    warn!(sku = %sku, error = %err, "Failed to mark link synced");
                    summary.errors += 1;
                }
            } else if let Some(conflicts) = decision.conflicts {
                link.record_conflicts(conflicts);
                match self.catalog.upsert_link(&link).await {
                    Ok(()) => summary.conflicted += 1,
                    Err(err) => {
                        warn!(sku = %sku, error = %err, "Failed to record conflicts");
                        summary.errors += 1;
                    }
                }
            }
            // Internal-wins lands here with no conflicts and no update:
            // the link is deliberately left untouched.
        }

        info!(
            source = %source,
            checked = summary.checked,
            updated = summary.updated,
            conflicted = summary.conflicted,
            unlinked = summary.unlinked,
            errors = summary.errors,
            "Pull finished"
        );
        Ok(summary)
    }

    async fn apply_update(
        &self,
        record_id: &skusync_core::domain::newtypes::RecordId,
        update: &skusync_conflict::UpdateSet,
    ) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        self.catalog
            .update_record_fields(record_id, update)
            .await
            .context("Failed to write updated fields")
    }
}
