//! The three reconciliation algorithms
//!
//! The [`Scanner`] executes one algorithm for a running session:
//!
//! 1. **Link scan**: classify every internal record against the source
//!    (already linked / matched / conflict / unmatched).
//! 2. **Missing-in-internal**: records that exist externally but not
//!    internally (import candidates).
//! 3. **Missing-in-external**: internal records with no external counterpart
//!    (publication candidates).
//!
//! All three share the same loop shape: the external key set is fetched once
//! by the caller and treated as a read-only index; internal records are
//! enumerated in stable id order; candidates are processed in fixed-size
//! batches with one result insert and one atomic counter increment per
//! batch; the cancellation flag is polled between batches.
//!
//! Per-record failures (a detail fetch timing out, a malformed payload) are
//! logged and counted in `errors_count`; they never abort the run.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use skusync_core::domain::record::CatalogRecord;
use skusync_core::domain::scan_result::{MatchStatus, ScanResult};
use skusync_core::domain::session::{ScanKind, ScanSession};
use skusync_core::ports::catalog::ICatalogRepository;
use skusync_core::ports::scan_store::IScanStore;
use skusync_core::ports::source_adapter::ISourceAdapter;
use skusync_conflict::diff_scan_fields;

/// Default number of records processed between counter flushes
pub const DEFAULT_BATCH_SIZE: usize = 100;

// ============================================================================
// ScanOutcome
// ============================================================================

/// How one algorithm run ended
#[derive(Debug)]
pub enum ScanOutcome {
    /// The algorithm finished; carries the completion summary
    Completed(serde_json::Value),
    /// Cancellation was requested and honored between batches
    Cancelled,
}

// ============================================================================
// BatchSink
// ============================================================================

/// Accumulates results and counter deltas for one batch
///
/// `flush` persists the pending rows and issues a single atomic counter
/// increment, so a crash mid-run leaves counters consistent with the rows
/// actually written.
struct BatchSink<'a> {
    store: &'a dyn IScanStore,
    session: &'a ScanSession,
    batch_size: usize,
    pending: Vec<ScanResult>,
    scanned: u64,
    matched: u64,
    unmatched: u64,
    errors: u64,
    total_scanned: u64,
}

impl<'a> BatchSink<'a> {
    fn new(store: &'a dyn IScanStore, session: &'a ScanSession, batch_size: usize) -> Self {
        Self {
            store,
            session,
            batch_size: batch_size.max(1),
            pending: Vec::new(),
            scanned: 0,
            matched: 0,
            unmatched: 0,
            errors: 0,
            total_scanned: 0,
        }
    }

    /// Records one evaluated candidate with an optional result row
    fn push(&mut self, result: Option<ScanResult>, status: MatchStatus) {
        self.scanned += 1;
        if status.counts_as_matched() {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
        if let Some(result) = result {
            self.pending.push(result);
        }
    }

    /// Records one candidate whose processing failed
    fn push_error(&mut self) {
        self.scanned += 1;
        self.errors += 1;
    }

    fn batch_full(&self) -> bool {
        self.scanned as usize >= self.batch_size
    }

    /// Persists the pending rows and counter deltas, if any
    async fn flush(&mut self) -> Result<()> {
        if self.scanned == 0 {
            return Ok(());
        }
        if !self.pending.is_empty() {
            self.store
                .insert_results(&self.pending)
                .await
                .context("Failed to persist scan result batch")?;
        }
        self.store
            .increment_counters(
                self.session.id(),
                self.scanned,
                self.matched,
                self.unmatched,
                self.errors,
            )
            .await
            .context("Failed to increment session counters")?;

        debug!(
            session_id = %self.session.id(),
            scanned = self.scanned,
            matched = self.matched,
            unmatched = self.unmatched,
            errors = self.errors,
            "Batch flushed"
        );

        self.total_scanned += self.scanned;
        self.pending.clear();
        self.scanned = 0;
        self.matched = 0;
        self.unmatched = 0;
        self.errors = 0;
        Ok(())
    }

    /// Flushes a full batch and polls the cancellation flag
    ///
    /// Returns true when the caller should stop processing.
    async fn flush_and_check_cancel(&mut self) -> Result<bool> {
        if !self.batch_full() {
            return Ok(false);
        }
        self.flush().await?;
        let cancelled = self
            .store
            .is_cancel_requested(self.session.id())
            .await
            .context("Failed to poll the cancellation flag")?;
        if cancelled {
            info!(session_id = %self.session.id(), "Cancellation requested, stopping between batches");
        }
        Ok(cancelled)
    }
}

// ============================================================================
// Scanner
// ============================================================================

/// Executes one reconciliation algorithm against a running session
pub struct Scanner {
    scan_store: Arc<dyn IScanStore>,
    catalog: Arc<dyn ICatalogRepository>,
    batch_size: usize,
}

impl Scanner {
    /// Creates a scanner with the given persistence dependencies
    pub fn new(
        scan_store: Arc<dyn IScanStore>,
        catalog: Arc<dyn ICatalogRepository>,
        batch_size: usize,
    ) -> Self {
        Self {
            scan_store,
            catalog,
            batch_size: batch_size.max(1),
        }
    }

    /// Runs the session's algorithm to completion or cancellation
    ///
    /// `external_skus` is the source's full key set, fetched once by the
    /// caller (the runner retries that fetch; this method does not).
    /// The session must be `Running`; its candidate-set size is recorded
    /// via `expected_total` before processing starts.
    pub async fn run(
        &self,
        session: &mut ScanSession,
        adapter: &Arc<dyn ISourceAdapter>,
        external_skus: HashSet<String>,
    ) -> Result<ScanOutcome> {
        let start = std::time::Instant::now();
        info!(
            session_id = %session.id(),
            source = %session.source(),
            kind = %session.kind(),
            external_skus = external_skus.len(),
            "Scan starting"
        );

        let outcome = match session.kind() {
            ScanKind::LinkScan => self.link_scan(session, adapter, &external_skus).await?,
            ScanKind::MissingInternal => {
                self.missing_internal(session, adapter, &external_skus)
                    .await?
            }
            ScanKind::MissingExternal => self.missing_external(session, &external_skus).await?,
        };

        let outcome = match outcome {
            LoopOutcome::Cancelled => ScanOutcome::Cancelled,
            LoopOutcome::Finished { candidates } => {
                ScanOutcome::Completed(serde_json::json!({
                    "external_skus": external_skus.len(),
                    "candidates": candidates,
                    "duration_ms": start.elapsed().as_millis() as u64,
                }))
            }
        };
        Ok(outcome)
    }

    /// Loads internal records and keeps the first record per SKU
    ///
    /// Blank SKUs are excluded entirely; later duplicates are skipped with
    /// a warning. Enumeration order is the repository's stable id order, so
    /// the winner is deterministic across runs.
    async fn internal_candidates(&self) -> Result<Vec<(String, CatalogRecord)>> {
        let records = self
            .catalog
            .list_records()
            .await
            .context("Failed to enumerate internal records")?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut candidates = Vec::new();
        for record in records {
            let Some(sku) = record.sku() else {
                debug!(record_id = %record.id, "Skipping record with blank SKU");
                continue;
            };
            let key = sku.as_str().to_string();
            if !seen.insert(key.clone()) {
                warn!(
                    sku = %key,
                    record_id = %record.id,
                    "Duplicate SKU, keeping the first record only"
                );
                continue;
            }
            candidates.push((key, record));
        }
        Ok(candidates)
    }

    /// Link scan: classify every internal record against the source
    async fn link_scan(
        &self,
        session: &mut ScanSession,
        adapter: &Arc<dyn ISourceAdapter>,
        external_skus: &HashSet<String>,
    ) -> Result<LoopOutcome> {
        let candidates = self.internal_candidates().await?;
        self.record_expected_total(session, candidates.len()).await?;

        let mut sink = BatchSink::new(self.scan_store.as_ref(), session, self.batch_size);
        for (sku, record) in &candidates {
            if record.is_linked_to(session.source()) {
                let external_id = record
                    .link_for(session.source())
                    .map(|l| l.external_id.clone());
                let result = ScanResult::new(
                    *session.id(),
                    sku,
                    &record.name,
                    external_id,
                    Some(record.id),
                    MatchStatus::AlreadyLinked,
                    Some(record.snapshot()),
                    None,
                    None,
                )?;
                sink.push(Some(result), MatchStatus::AlreadyLinked);
            } else if external_skus.contains(sku) {
                match adapter.get_by_sku(sku).await {
                    Ok(Some(external)) => {
                        let diffs = diff_scan_fields(record, &external);
                        let (status, diff) = if diffs.is_empty() {
                            (MatchStatus::Matched, None)
                        } else {
                            (MatchStatus::Conflict, Some(diffs))
                        };
                        let result = ScanResult::new(
                            *session.id(),
                            sku,
                            &record.name,
                            Some(external.external_id.clone()),
                            Some(record.id),
                            status,
                            Some(record.snapshot()),
                            Some(external.snapshot()),
                            diff,
                        )?;
                        sink.push(Some(result), status);
                    }
                    Ok(None) => {
                        // Listed but gone on detail fetch: treat as absent.
                        let result = unmatched_internal(session, sku, record)?;
                        sink.push(Some(result), MatchStatus::Unmatched);
                    }
                    Err(err) => {
                        warn!(sku = %sku, error = %err, "Detail fetch failed, counting as error");
                        sink.push_error();
                    }
                }
            } else {
                let result = unmatched_internal(session, sku, record)?;
                sink.push(Some(result), MatchStatus::Unmatched);
            }

            if sink.flush_and_check_cancel().await? {
                return Ok(LoopOutcome::Cancelled);
            }
        }
        sink.flush().await?;
        Ok(LoopOutcome::Finished {
            candidates: candidates.len() as u64,
        })
    }

    /// Missing-in-internal: external keys with no internal record
    async fn missing_internal(
        &self,
        session: &mut ScanSession,
        adapter: &Arc<dyn ISourceAdapter>,
        external_skus: &HashSet<String>,
    ) -> Result<LoopOutcome> {
        let internal: HashSet<String> = self
            .internal_candidates()
            .await?
            .into_iter()
            .map(|(sku, _)| sku)
            .collect();

        let mut missing: Vec<&String> = external_skus.difference(&internal).collect();
        missing.sort();
        self.record_expected_total(session, missing.len()).await?;

        let mut sink = BatchSink::new(self.scan_store.as_ref(), session, self.batch_size);
        for sku in missing {
            match adapter.get_by_sku(sku).await {
                Ok(Some(external)) => {
                    let name = external.name.clone().unwrap_or_else(|| sku.clone());
                    let result = ScanResult::new(
                        *session.id(),
                        sku,
                        name,
                        Some(external.external_id.clone()),
                        None,
                        MatchStatus::Unmatched,
                        None,
                        Some(external.snapshot()),
                        None,
                    )?;
                    sink.push(Some(result), MatchStatus::Unmatched);
                }
                Ok(None) => {
                    warn!(sku = %sku, "Listed SKU vanished before detail fetch, skipping");
                    sink.push_error();
                }
                Err(err) => {
                    warn!(sku = %sku, error = %err, "Detail fetch failed, counting as error");
                    sink.push_error();
                }
            }

            if sink.flush_and_check_cancel().await? {
                return Ok(LoopOutcome::Cancelled);
            }
        }
        sink.flush().await?;
        Ok(LoopOutcome::Finished {
            candidates: sink.total_scanned,
        })
    }

    /// Missing-in-external: internal records absent from the source
    ///
    /// Evaluates all internal records, not only linked ones; records present
    /// externally count as matched and produce no row.
    async fn missing_external(
        &self,
        session: &mut ScanSession,
        external_skus: &HashSet<String>,
    ) -> Result<LoopOutcome> {
        let candidates = self.internal_candidates().await?;
        self.record_expected_total(session, candidates.len()).await?;

        let mut sink = BatchSink::new(self.scan_store.as_ref(), session, self.batch_size);
        for (sku, record) in &candidates {
            if external_skus.contains(sku) {
                sink.push(None, MatchStatus::Matched);
            } else {
                // Carry the existing links so the operator can see where the
                // record is already published.
                let mut snapshot = record.snapshot();
                if let Some(obj) = snapshot.as_object_mut() {
                    obj.insert("links".to_string(), record.links_snapshot());
                }
                let result = ScanResult::new(
                    *session.id(),
                    sku,
                    &record.name,
                    None,
                    Some(record.id),
                    MatchStatus::Unmatched,
                    Some(snapshot),
                    None,
                    None,
                )?;
                sink.push(Some(result), MatchStatus::Unmatched);
            }

            if sink.flush_and_check_cancel().await? {
                return Ok(LoopOutcome::Cancelled);
            }
        }
        sink.flush().await?;
        Ok(LoopOutcome::Finished {
            candidates: candidates.len() as u64,
        })
    }

    /// Persists the candidate-set size so progress polling can report it
    async fn record_expected_total(&self, session: &mut ScanSession, total: usize) -> Result<()> {
        session.set_expected_total(total as u64);
        self.scan_store
            .update_session(session)
            .await
            .context("Failed to persist the expected total")
    }
}

/// Builds the unmatched row for an internal record absent from the source
fn unmatched_internal(
    session: &ScanSession,
    sku: &str,
    record: &CatalogRecord,
) -> Result<ScanResult> {
    Ok(ScanResult::new(
        *session.id(),
        sku,
        &record.name,
        None,
        Some(record.id),
        MatchStatus::Unmatched,
        Some(record.snapshot()),
        None,
        None,
    )?)
}

/// Internal loop outcome, before the completion summary is attached
enum LoopOutcome {
    Finished { candidates: u64 },
    Cancelled,
}
