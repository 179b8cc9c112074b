//! Scan store port (driven/secondary port)
//!
//! Persistence seam for scan sessions and their per-record results.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, …) and don't need domain-level classification.
//! - Counter updates are expressed as *increments*, never absolute values,
//!   so implementations can issue atomic per-field `UPDATE ... SET c = c + ?`
//!   statements and tolerate concurrent partial writes.
//! - Cancellation is a flag on the session row; the running job polls it
//!   between batches (cooperative cancellation only).

use crate::domain::newtypes::{RecordId, ResultId, SessionId};
use crate::domain::scan_result::{MatchStatus, ResolutionStatus, ScanResult};
use crate::domain::session::ScanSession;

// ============================================================================
// ResultFilter
// ============================================================================

/// Filter criteria for querying scan results
///
/// All optional fields combine with AND logic; `search` matches
/// case-insensitively against sku and name.
#[derive(Debug, Clone)]
pub struct ResultFilter {
    /// The owning session
    pub session_id: SessionId,
    /// Filter by classification
    pub match_status: Option<MatchStatus>,
    /// Filter by resolution state
    pub resolution_status: Option<ResolutionStatus>,
    /// Free-text search over sku and name
    pub search: Option<String>,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub per_page: u32,
}

impl ResultFilter {
    /// Creates a filter for a session with default paging (page 1, 50 rows)
    pub fn for_session(session_id: SessionId) -> Self {
        Self {
            session_id,
            match_status: None,
            resolution_status: None,
            search: None,
            page: 1,
            per_page: 50,
        }
    }

    /// Sets the match status filter
    pub fn with_match_status(mut self, status: MatchStatus) -> Self {
        self.match_status = Some(status);
        self
    }

    /// Sets the resolution status filter
    pub fn with_resolution_status(mut self, status: ResolutionStatus) -> Self {
        self.resolution_status = Some(status);
        self
    }

    /// Sets the free-text search term
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Sets the page (1-based) and page size
    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page.max(1);
        self.per_page = per_page.max(1);
        self
    }
}

/// One page of scan results plus the unpaged total
#[derive(Debug, Clone)]
pub struct ResultPage {
    /// The results on this page, in source-iteration order
    pub results: Vec<ScanResult>,
    /// Total matching rows across all pages
    pub total: u64,
}

// ============================================================================
// IScanStore trait
// ============================================================================

/// Port trait for scan session and result persistence
#[async_trait::async_trait]
pub trait IScanStore: Send + Sync {
    // --- Sessions ---

    /// Persists a new session (insert)
    async fn create_session(&self, session: &ScanSession) -> anyhow::Result<()>;

    /// Loads a session by id
    async fn get_session(&self, id: &SessionId) -> anyhow::Result<Option<ScanSession>>;

    /// Persists a session's current status, timestamps, and summary
    ///
    /// Counters are *not* written here; see [`IScanStore::increment_counters`].
    async fn update_session(&self, session: &ScanSession) -> anyhow::Result<()>;

    /// Atomically adds one batch worth of counter increments
    async fn increment_counters(
        &self,
        id: &SessionId,
        scanned: u64,
        matched: u64,
        unmatched: u64,
        errors: u64,
    ) -> anyhow::Result<()>;

    /// Marks the session for cooperative cancellation
    async fn request_cancel(&self, id: &SessionId) -> anyhow::Result<()>;

    /// Returns whether cancellation has been requested
    async fn is_cancel_requested(&self, id: &SessionId) -> anyhow::Result<bool>;

    // --- Results ---

    /// Inserts a batch of result rows
    async fn insert_results(&self, results: &[ScanResult]) -> anyhow::Result<()>;

    /// Loads a single result by id
    async fn get_result(&self, id: &ResultId) -> anyhow::Result<Option<ScanResult>>;

    /// Queries results matching the filter, paged
    async fn query_results(&self, filter: &ResultFilter) -> anyhow::Result<ResultPage>;

    /// Persists a result's resolution state (and optional internal record)
    async fn update_resolution(
        &self,
        id: &ResultId,
        status: ResolutionStatus,
        internal_record_id: Option<RecordId>,
    ) -> anyhow::Result<()>;
}
