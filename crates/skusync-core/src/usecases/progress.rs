//! Session progress polling use case

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::newtypes::SessionId;
use crate::ports::scan_store::IScanStore;

/// Progress snapshot of one scan session, shaped for display
#[derive(Debug, Clone, Serialize)]
pub struct SessionProgress {
    /// Current lifecycle status ("pending", "running", …)
    pub status: String,
    /// Records evaluated so far
    pub total_scanned: u64,
    /// Records classified matched (including already-linked)
    pub matched: u64,
    /// Records classified unmatched
    pub unmatched: u64,
    /// Handled per-record errors
    pub errors: u64,
    /// Progress percentage (0–100; 0 while the candidate set size is
    /// unknown, 100 once terminal)
    pub percent_complete: f64,
    /// Failure message, for failed sessions
    pub error_message: Option<String>,
}

/// Use case for polling a session's progress
pub struct SessionProgressUseCase {
    scan_store: Arc<dyn IScanStore>,
}

impl SessionProgressUseCase {
    /// Creates the use case with its store dependency
    pub fn new(scan_store: Arc<dyn IScanStore>) -> Self {
        Self { scan_store }
    }

    /// Returns the progress snapshot, or `None` for an unknown session
    pub async fn execute(&self, session_id: &SessionId) -> Result<Option<SessionProgress>> {
        let Some(session) = self
            .scan_store
            .get_session(session_id)
            .await
            .context("Failed to load scan session")?
        else {
            return Ok(None);
        };

        Ok(Some(SessionProgress {
            status: session.status().to_string(),
            total_scanned: session.total_scanned(),
            matched: session.matched_count(),
            unmatched: session.unmatched_count(),
            errors: session.errors_count(),
            percent_complete: session.percent_complete(),
            error_message: session.error_message().map(str::to_string),
        }))
    }
}
