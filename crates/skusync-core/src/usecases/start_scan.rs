//! Scan submission use case
//!
//! Creates the pending session row that a background job will later pick
//! up. The job payload carries only the session id; the runner re-resolves
//! the session at execution time, so a session deleted between enqueue and
//! execution degrades to a no-op instead of a crash.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::newtypes::{SessionId, SourceId};
use crate::domain::record::{SourceRef, SourceType};
use crate::domain::session::{ScanKind, ScanSession};
use crate::ports::scan_store::IScanStore;

/// Use case for submitting a new reconciliation run
pub struct StartScanUseCase {
    scan_store: Arc<dyn IScanStore>,
}

impl StartScanUseCase {
    /// Creates the use case with its store dependency
    pub fn new(scan_store: Arc<dyn IScanStore>) -> Self {
        Self { scan_store }
    }

    /// Creates a pending session for the given source and scan kind
    ///
    /// # Returns
    /// The id of the created session, for the caller to enqueue and poll
    pub async fn execute(
        &self,
        source_type: SourceType,
        source_id: Option<SourceId>,
        kind: ScanKind,
    ) -> Result<SessionId> {
        let source = SourceRef::new(source_type, source_id);
        let session = ScanSession::new(source.clone(), kind);
        let session_id = *session.id();

        self.scan_store
            .create_session(&session)
            .await
            .context("Failed to persist scan session")?;

        info!(
            session_id = %session_id,
            source = %source,
            kind = %kind,
            "Scan session created"
        );

        Ok(session_id)
    }
}
