//! ScanResult domain entity
//!
//! One row per record evaluated during a run that requires operator
//! attention (candidates for linking, import, or publication) plus the
//! conflict/matched rows needed for display. Results are created only by a
//! running scan job and resolved later by explicit operator actions.

use serde::{Deserialize, Serialize};

use super::conflict::FieldDiff;
use super::errors::DomainError;
use super::newtypes::{RecordId, ResultId, SessionId};

// ============================================================================
// MatchStatus / ResolutionStatus
// ============================================================================

/// How a record was classified by the scan algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Key found on both sides, not yet linked, no field differences
    Matched,
    /// Key present on one side only
    Unmatched,
    /// Key found on both sides with field-level differences
    Conflict,
    /// Key matched more than one record
    Multiple,
    /// The record is already linked to this source
    AlreadyLinked,
}

impl MatchStatus {
    /// Stable string name used in storage and on the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Matched => "matched",
            MatchStatus::Unmatched => "unmatched",
            MatchStatus::Conflict => "conflict",
            MatchStatus::Multiple => "multiple",
            MatchStatus::AlreadyLinked => "already_linked",
        }
    }

    /// Whether this classification counts toward the matched counter
    pub fn counts_as_matched(&self) -> bool {
        matches!(
            self,
            MatchStatus::Matched | MatchStatus::Conflict | MatchStatus::AlreadyLinked
        )
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matched" => Ok(MatchStatus::Matched),
            "unmatched" => Ok(MatchStatus::Unmatched),
            "conflict" => Ok(MatchStatus::Conflict),
            "multiple" => Ok(MatchStatus::Multiple),
            "already_linked" => Ok(MatchStatus::AlreadyLinked),
            other => Err(DomainError::UnknownValue {
                kind: "match status".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// What the operator has done about a result so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Awaiting an operator decision
    Pending,
    /// Linked to an existing internal record
    Linked,
    /// A new record was created (imported internally or published externally)
    Created,
    /// Explicitly dismissed
    Ignored,
    /// A resolution action failed
    Error,
}

impl ResolutionStatus {
    /// Stable string name used in storage and on the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Pending => "pending",
            ResolutionStatus::Linked => "linked",
            ResolutionStatus::Created => "created",
            ResolutionStatus::Ignored => "ignored",
            ResolutionStatus::Error => "error",
        }
    }

    /// Returns true once an operator action has been applied
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ResolutionStatus::Pending)
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResolutionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ResolutionStatus::Pending),
            "linked" => Ok(ResolutionStatus::Linked),
            "created" => Ok(ResolutionStatus::Created),
            "ignored" => Ok(ResolutionStatus::Ignored),
            "error" => Ok(ResolutionStatus::Error),
            other => Err(DomainError::UnknownValue {
                kind: "resolution status".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// ScanResult
// ============================================================================

/// A per-record outcome produced by one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Unique identifier
    id: ResultId,
    /// The session that produced this result
    session_id: SessionId,
    /// Business key of the evaluated record
    sku: String,
    /// Display name at scan time
    name: String,
    /// External record identifier, when the record exists externally
    external_id: Option<String>,
    /// Internal record identifier, when the record exists internally
    internal_record_id: Option<RecordId>,
    /// Classification
    match_status: MatchStatus,
    /// Operator resolution state
    resolution_status: ResolutionStatus,
    /// Structured copy of internal fields at scan time
    internal_snapshot: Option<serde_json::Value>,
    /// Structured copy of external fields at scan time
    external_snapshot: Option<serde_json::Value>,
    /// Per-field differences, populated only for conflicts
    diff: Option<Vec<FieldDiff>>,
}

impl ScanResult {
    /// Creates a result row, enforcing the snapshot invariant
    ///
    /// At most one of the two snapshots may be absent; a result carrying
    /// neither would be undisplayable and is rejected. `AlreadyLinked`
    /// results start out resolved as `Linked`; everything else starts
    /// `Pending`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: SessionId,
        sku: impl Into<String>,
        name: impl Into<String>,
        external_id: Option<String>,
        internal_record_id: Option<RecordId>,
        match_status: MatchStatus,
        internal_snapshot: Option<serde_json::Value>,
        external_snapshot: Option<serde_json::Value>,
        diff: Option<Vec<FieldDiff>>,
    ) -> Result<Self, DomainError> {
        if internal_snapshot.is_none() && external_snapshot.is_none() {
            return Err(DomainError::ValidationFailed(
                "a scan result needs at least one snapshot".to_string(),
            ));
        }
        if match_status == MatchStatus::Conflict && diff.as_ref().map_or(true, |d| d.is_empty()) {
            return Err(DomainError::ValidationFailed(
                "a conflict result needs a non-empty diff".to_string(),
            ));
        }

        let resolution_status = if match_status == MatchStatus::AlreadyLinked {
            ResolutionStatus::Linked
        } else {
            ResolutionStatus::Pending
        };

        Ok(Self {
            id: ResultId::new(),
            session_id,
            sku: sku.into(),
            name: name.into(),
            external_id,
            internal_record_id,
            match_status,
            resolution_status,
            internal_snapshot,
            external_snapshot,
            diff,
        })
    }

    /// Reconstitutes a result from storage without re-validating
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ResultId,
        session_id: SessionId,
        sku: String,
        name: String,
        external_id: Option<String>,
        internal_record_id: Option<RecordId>,
        match_status: MatchStatus,
        resolution_status: ResolutionStatus,
        internal_snapshot: Option<serde_json::Value>,
        external_snapshot: Option<serde_json::Value>,
        diff: Option<Vec<FieldDiff>>,
    ) -> Self {
        Self {
            id,
            session_id,
            sku,
            name,
            external_id,
            internal_record_id,
            match_status,
            resolution_status,
            internal_snapshot,
            external_snapshot,
            diff,
        }
    }

    // --- Getters ---

    /// Returns the result's unique identifier
    pub fn id(&self) -> &ResultId {
        &self.id
    }

    /// Returns the owning session id
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns the business key
    pub fn sku(&self) -> &str {
        &self.sku
    }

    /// Returns the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the external record identifier, if known
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    /// Returns the internal record identifier, if known
    pub fn internal_record_id(&self) -> Option<&RecordId> {
        self.internal_record_id.as_ref()
    }

    /// Returns the classification
    pub fn match_status(&self) -> MatchStatus {
        self.match_status
    }

    /// Returns the resolution state
    pub fn resolution_status(&self) -> ResolutionStatus {
        self.resolution_status
    }

    /// Returns the internal snapshot, if the record exists internally
    pub fn internal_snapshot(&self) -> Option<&serde_json::Value> {
        self.internal_snapshot.as_ref()
    }

    /// Returns the external snapshot, if the record exists externally
    pub fn external_snapshot(&self) -> Option<&serde_json::Value> {
        self.external_snapshot.as_ref()
    }

    /// Returns the per-field differences, for conflicts
    pub fn diff(&self) -> Option<&[FieldDiff]> {
        self.diff.as_deref()
    }

    // --- Resolution ---

    /// Applies an operator resolution
    ///
    /// Idempotent: resolving an already-resolved result with the same
    /// outcome is a no-op; with a different outcome it is rejected.
    pub fn resolve(
        &mut self,
        status: ResolutionStatus,
        record_id: Option<RecordId>,
    ) -> Result<bool, DomainError> {
        if self.resolution_status == status {
            return Ok(false);
        }
        if self.resolution_status.is_resolved() {
            return Err(DomainError::InvalidState {
                from: self.resolution_status.to_string(),
                to: status.to_string(),
            });
        }
        self.resolution_status = status;
        if record_id.is_some() {
            self.internal_record_id = record_id;
        }
        Ok(true)
    }
}
