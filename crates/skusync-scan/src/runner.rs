//! Scan job runner
//!
//! Executes one pending session end to end: resolves the session by id,
//! builds the source adapter, runs the algorithm under a timeout, and
//! always finalizes the session into a terminal state.
//!
//! ## Guarantees
//!
//! - The job payload is the session id only; a session deleted between
//!   submission and execution degrades to a logged no-op, never a crash.
//! - An in-process lock keyed by session id (30-minute TTL) makes a second
//!   execution attempt for the same session a no-op.
//! - A cancellation requested while the session was still queued is honored
//!   before any source request is made.
//! - Adapter construction failure fails the session before it ever runs.
//! - A transient failure while fetching the external key set is retried on
//!   the configured fixed backoff schedule (default 60 s / 300 s / 600 s).
//! - After the algorithm returns or errors, the runner re-checks the stored
//!   session and fails anything still marked running.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use skusync_core::config::Config;
use skusync_core::domain::newtypes::{SessionId, SourceId};
use skusync_core::domain::record::SourceType;
use skusync_core::domain::session::{ScanSession, ScanStatus};
use skusync_core::ports::catalog::ICatalogRepository;
use skusync_core::ports::scan_store::IScanStore;
use skusync_core::ports::source_adapter::{ISourceAdapter, SourceError};

use crate::scanner::{ScanOutcome, Scanner};

/// How long an execution lock entry stays valid
const LOCK_TTL: Duration = Duration::from_secs(30 * 60);

/// Builds a source adapter for a session's source selector
pub type AdapterFactory = dyn Fn(&Config, SourceType, Option<&SourceId>) -> Result<Arc<dyn ISourceAdapter>, SourceError>
    + Send
    + Sync;

/// Executes pending scan sessions
pub struct ScanRunner {
    config: Config,
    scan_store: Arc<dyn IScanStore>,
    scanner: Scanner,
    adapter_factory: Arc<AdapterFactory>,
    /// Session ids currently (or recently) being executed, with acquisition time
    locks: Mutex<HashMap<SessionId, Instant>>,
}

impl ScanRunner {
    /// Creates a runner wired to the real adapter factory
    pub fn new(
        config: Config,
        scan_store: Arc<dyn IScanStore>,
        catalog: Arc<dyn ICatalogRepository>,
    ) -> Self {
        let scanner = Scanner::new(scan_store.clone(), catalog, config.scan.batch_size);
        Self {
            config,
            scan_store,
            scanner,
            adapter_factory: Arc::new(skusync_sources::build_adapter),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the adapter factory (used by tests to inject mock sources)
    pub fn with_adapter_factory(mut self, factory: Arc<AdapterFactory>) -> Self {
        self.adapter_factory = factory;
        self
    }

    /// Executes the session with the given id
    ///
    /// Returns `Ok(())` for every handled outcome, including "session not
    /// found" and "already being executed": the job's own success is
    /// independent of the session's terminal state.
    pub async fn execute(&self, session_id: SessionId) -> Result<()> {
        if !self.try_acquire(session_id) {
            warn!(session_id = %session_id, "Session is already being executed, skipping");
            return Ok(());
        }
        let outcome = self.execute_locked(session_id).await;
        self.release(session_id);
        outcome
    }

    async fn execute_locked(&self, session_id: SessionId) -> Result<()> {
        let Some(mut session) = self
            .scan_store
            .get_session(&session_id)
            .await
            .context("Failed to load session for execution")?
        else {
            warn!(session_id = %session_id, "Session no longer exists, skipping");
            return Ok(());
        };

        if *session.status() != ScanStatus::Pending {
            warn!(
                session_id = %session_id,
                status = %session.status(),
                "Session is not pending, skipping"
            );
            return Ok(());
        }

        // Cancellation requested while the session sat in the queue.
        if self
            .scan_store
            .is_cancel_requested(&session_id)
            .await
            .context("Failed to poll the cancellation flag")?
        {
            info!(session_id = %session_id, "Session cancelled before execution");
            session.cancel()?;
            self.scan_store
                .update_session(&session)
                .await
                .context("Failed to persist the cancelled session")?;
            return Ok(());
        }

        let source = session.source().clone();
        let adapter = match (self.adapter_factory)(
            &self.config,
            source.source_type,
            source.source_id.as_ref(),
        ) {
            Ok(adapter) => adapter,
            Err(err) => {
                error!(session_id = %session_id, source = %source, error = %err, "Adapter setup failed");
                session.fail(format!("adapter setup failed: {err}"))?;
                self.scan_store
                    .update_session(&session)
                    .await
                    .context("Failed to persist adapter setup failure")?;
                return Ok(());
            }
        };

        session.start()?;
        self.scan_store
            .update_session(&session)
            .await
            .context("Failed to persist session start")?;

        let timeout = Duration::from_secs(self.config.scan.job_timeout_secs);
        match tokio::time::timeout(timeout, self.run_scan(&mut session, &adapter)).await {
            Ok(Ok(ScanOutcome::Completed(summary))) => {
                info!(session_id = %session_id, "Scan completed");
                session.complete(summary)?;
            }
            Ok(Ok(ScanOutcome::Cancelled)) => {
                info!(session_id = %session_id, "Scan cancelled");
                session.cancel()?;
            }
            Ok(Err(err)) => {
                error!(session_id = %session_id, error = ?err, "Scan failed");
                session.fail(format!("{err:#}"))?;
            }
            Err(_elapsed) => {
                error!(
                    session_id = %session_id,
                    timeout_secs = timeout.as_secs(),
                    "Scan exceeded its timeout ceiling"
                );
                session.fail(format!(
                    "scan exceeded the {} second timeout",
                    timeout.as_secs()
                ))?;
            }
        }
        self.scan_store
            .update_session(&session)
            .await
            .context("Failed to persist the terminal session state")?;

        self.finalize_stragglers(&session_id).await
    }

    /// Fetches the external key set (with retries) and runs the algorithm
    ///
    /// Only the key-set fetch is retried: re-running the batch loop after a
    /// partial run would duplicate result rows.
    async fn run_scan(
        &self,
        session: &mut ScanSession,
        adapter: &Arc<dyn ISourceAdapter>,
    ) -> Result<ScanOutcome> {
        let schedule = &self.config.scan.retry_backoff_secs;
        let mut attempt = 0usize;
        let external_skus = loop {
            match adapter.list_skus().await {
                Ok(skus) => break skus,
                Err(err) if err.is_transient() && attempt < schedule.len() => {
                    let delay_secs = schedule[attempt];
                    attempt += 1;
                    warn!(
                        session_id = %session.id(),
                        attempt,
                        delay_secs,
                        error = %err,
                        "Transient error fetching external keys, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                }
                Err(err) => {
                    return Err(err).context("Failed to fetch the external key set");
                }
            }
        };

        self.scanner.run(session, adapter, external_skus).await
    }

    /// Fails the stored session if it is somehow still marked running
    ///
    /// The execute path always writes a terminal state; this re-check covers
    /// lost writes and future refactoring mistakes.
    async fn finalize_stragglers(&self, session_id: &SessionId) -> Result<()> {
        let Some(mut session) = self.scan_store.get_session(session_id).await? else {
            return Ok(());
        };
        if session.status().is_running() {
            warn!(session_id = %session_id, "Session still running after job end, failing it");
            session.fail("runner exited without finalizing the session")?;
            self.scan_store.update_session(&session).await?;
        }
        Ok(())
    }

    // --- Execution lock ---

    fn try_acquire(&self, session_id: SessionId) -> bool {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        locks.retain(|_, acquired| acquired.elapsed() < LOCK_TTL);
        if locks.contains_key(&session_id) {
            return false;
        }
        locks.insert(session_id, Instant::now());
        true
    }

    fn release(&self, session_id: SessionId) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        locks.remove(&session_id);
    }
}
