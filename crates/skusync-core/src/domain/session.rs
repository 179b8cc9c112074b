//! ScanSession domain entity
//!
//! A `ScanSession` tracks one reconciliation run: which source it targets,
//! which algorithm it runs, its lifecycle state, and its progress counters.
//! Transitions are monotone (pending → running → one terminal state); the
//! entity rejects anything else so a finished session can never be revived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::SessionId;
use super::record::SourceRef;

// ============================================================================
// ScanKind
// ============================================================================

/// Which reconciliation algorithm a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
    /// For every internal record: linked, candidate link, or unmatched
    LinkScan,
    /// Records that exist externally but not internally (import candidates)
    MissingInternal,
    /// Internal records with no external counterpart (publication candidates)
    MissingExternal,
}

impl std::fmt::Display for ScanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScanKind::LinkScan => "link_scan",
            ScanKind::MissingInternal => "missing_internal",
            ScanKind::MissingExternal => "missing_external",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ScanKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link_scan" => Ok(ScanKind::LinkScan),
            "missing_internal" => Ok(ScanKind::MissingInternal),
            "missing_external" => Ok(ScanKind::MissingExternal),
            other => Err(DomainError::UnknownValue {
                kind: "scan kind".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// ScanStatus
// ============================================================================

/// Lifecycle status of a scan session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Created, not yet picked up by a job
    Pending,
    /// The owning job acquired the lock and began processing
    Running,
    /// The algorithm finished, even if some individual records errored
    Completed,
    /// An exception escaped the algorithm or adapter setup failed
    Failed(String),
    /// Cancelled by external request
    Cancelled,
}

impl ScanStatus {
    /// Returns true if the session is still in progress
    pub fn is_running(&self) -> bool {
        matches!(self, ScanStatus::Running)
    }

    /// Returns true if the session has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanStatus::Completed | ScanStatus::Failed(_) | ScanStatus::Cancelled
        )
    }

    /// Returns true if the session completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, ScanStatus::Completed)
    }

    /// Returns true if the session failed
    pub fn is_failed(&self) -> bool {
        matches!(self, ScanStatus::Failed(_))
    }

    fn name(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed(_) => "failed",
            ScanStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStatus::Failed(msg) => write!(f, "failed: {msg}"),
            other => write!(f, "{}", other.name()),
        }
    }
}

// ============================================================================
// ScanSession
// ============================================================================

/// One reconciliation run
///
/// Created pending by the enqueuing collaborator, mutated exclusively by the
/// job executing it (single-writer), never deleted by the engine itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSession {
    /// Unique identifier for this session
    id: SessionId,
    /// The source this run reconciles against
    source: SourceRef,
    /// Which algorithm this run executes
    kind: ScanKind,
    /// Current lifecycle status
    status: ScanStatus,
    /// Records evaluated so far
    total_scanned: u64,
    /// Records classified matched (includes already-linked)
    matched_count: u64,
    /// Records classified unmatched (candidates for action)
    unmatched_count: u64,
    /// Per-record processing errors (handled, not fatal)
    errors_count: u64,
    /// Size of the candidate set, once the algorithm has computed it
    expected_total: Option<u64>,
    /// When the session was created
    created_at: DateTime<Utc>,
    /// When the job started running (None while pending)
    started_at: Option<DateTime<Utc>>,
    /// When the session reached a terminal state
    completed_at: Option<DateTime<Utc>>,
    /// The failure message, for failed sessions
    error_message: Option<String>,
    /// Free-form metadata captured at completion (source record count,
    /// duration, …)
    result_summary: Option<serde_json::Value>,
}

impl ScanSession {
    /// Creates a new pending session
    pub fn new(source: SourceRef, kind: ScanKind) -> Self {
        Self {
            id: SessionId::new(),
            source,
            kind,
            status: ScanStatus::Pending,
            total_scanned: 0,
            matched_count: 0,
            unmatched_count: 0,
            errors_count: 0,
            expected_total: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
            result_summary: None,
        }
    }

    /// Reconstitutes a session from storage
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        source: SourceRef,
        kind: ScanKind,
        status: ScanStatus,
        counters: (u64, u64, u64, u64),
        expected_total: Option<u64>,
        created_at: DateTime<Utc>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
        error_message: Option<String>,
        result_summary: Option<serde_json::Value>,
    ) -> Self {
        let (total_scanned, matched_count, unmatched_count, errors_count) = counters;
        Self {
            id,
            source,
            kind,
            status,
            total_scanned,
            matched_count,
            unmatched_count,
            errors_count,
            expected_total,
            created_at,
            started_at,
            completed_at,
            error_message,
            result_summary,
        }
    }

    // --- Getters ---

    /// Returns the session's unique identifier
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the source this run targets
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Returns the scan kind
    pub fn kind(&self) -> ScanKind {
        self.kind
    }

    /// Returns the current status
    pub fn status(&self) -> &ScanStatus {
        &self.status
    }

    /// Returns the number of records evaluated so far
    pub fn total_scanned(&self) -> u64 {
        self.total_scanned
    }

    /// Returns the matched count (already-linked records count here too)
    pub fn matched_count(&self) -> u64 {
        self.matched_count
    }

    /// Returns the unmatched count
    pub fn unmatched_count(&self) -> u64 {
        self.unmatched_count
    }

    /// Returns the handled per-record error count
    pub fn errors_count(&self) -> u64 {
        self.errors_count
    }

    /// Returns the candidate set size, once known
    pub fn expected_total(&self) -> Option<u64> {
        self.expected_total
    }

    /// Records the candidate set size computed by the algorithm
    pub fn set_expected_total(&mut self, total: u64) {
        self.expected_total = Some(total);
    }

    /// Returns when the session was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the job started running
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the session reached a terminal state
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the failure message, for failed sessions
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the completion summary
    pub fn result_summary(&self) -> Option<&serde_json::Value> {
        self.result_summary.as_ref()
    }

    // --- Computed properties ---

    /// Progress as a percentage of the candidate set, 0.0 while the set
    /// size is unknown, 100.0 once terminal
    pub fn percent_complete(&self) -> f64 {
        if self.status.is_terminal() {
            return 100.0;
        }
        match self.expected_total {
            Some(total) if total > 0 => {
                (self.total_scanned as f64 / total as f64 * 100.0).min(100.0)
            }
            _ => 0.0,
        }
    }

    /// Wall-clock duration of the run (so far, or total once terminal)
    pub fn duration(&self) -> chrono::Duration {
        let start = self.started_at.unwrap_or(self.created_at);
        let end = self.completed_at.unwrap_or_else(Utc::now);
        end - start
    }

    // --- Transitions ---

    /// pending → running
    pub fn start(&mut self) -> Result<(), DomainError> {
        match self.status {
            ScanStatus::Pending => {
                self.status = ScanStatus::Running;
                self.started_at = Some(Utc::now());
                Ok(())
            }
            ref other => Err(invalid_transition(other, "running")),
        }
    }

    /// running → completed, recording the completion summary
    pub fn complete(&mut self, summary: serde_json::Value) -> Result<(), DomainError> {
        match self.status {
            ScanStatus::Running => {
                self.status = ScanStatus::Completed;
                self.completed_at = Some(Utc::now());
                self.result_summary = Some(summary);
                Ok(())
            }
            ref other => Err(invalid_transition(other, "completed")),
        }
    }

    /// pending|running → failed, recording the causing message
    ///
    /// Failure is allowed directly from pending because adapter setup can
    /// fail before the session ever transitions to running.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        match self.status {
            ScanStatus::Pending | ScanStatus::Running => {
                let reason = reason.into();
                self.status = ScanStatus::Failed(reason.clone());
                self.error_message = Some(reason);
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            ref other => Err(invalid_transition(other, "failed")),
        }
    }

    /// pending|running → cancelled
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        match self.status {
            ScanStatus::Pending | ScanStatus::Running => {
                self.status = ScanStatus::Cancelled;
                self.completed_at = Some(Utc::now());
                Ok(())
            }
            ref other => Err(invalid_transition(other, "cancelled")),
        }
    }

    // --- Counters ---

    /// Adds one batch worth of counter increments
    ///
    /// In storage this maps to atomic per-field increments; the in-memory
    /// entity mirrors the same additive semantics.
    pub fn add_progress(&mut self, scanned: u64, matched: u64, unmatched: u64, errors: u64) {
        self.total_scanned += scanned;
        self.matched_count += matched;
        self.unmatched_count += unmatched;
        self.errors_count += errors;
    }
}

fn invalid_transition(from: &ScanStatus, to: &str) -> DomainError {
    DomainError::InvalidState {
        from: from.name().to_string(),
        to: to.to_string(),
    }
}
