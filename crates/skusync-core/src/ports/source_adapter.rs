//! Source adapter port (driven/secondary port)
//!
//! This module defines the uniform facade over structurally different
//! external systems (ERP back-offices, storefronts). One implementation
//! exists per system type; callers depend only on this contract.
//!
//! ## Design Notes
//!
//! - Unlike the persistence ports, this seam uses the typed [`SourceError`]
//!   rather than `anyhow`: calling algorithms must distinguish "not found"
//!   from "transient" from "not implemented" to apply the right policy.
//! - `normalize` is a pure, total function: absent fields default to
//!   `None`/`false`, never an error.
//! - `test_connection` never fails; unreachable sources are reported as a
//!   failed [`ConnectionStatus`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::record::{CatalogRecord, ExternalRecord, SourceRef};

// ============================================================================
// SourceError
// ============================================================================

/// Adapter-level error taxonomy
///
/// Every network/API failure is wrapped into one of these kinds so calling
/// algorithms can branch on failure class instead of string matching.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Adapter construction failed: missing or invalid configuration
    #[error("Source unavailable: {0}")]
    Config(String),

    /// The integration for this source type is not implemented yet
    #[error("Integration not implemented (status {status}): missing {missing:?}")]
    NotImplemented {
        /// HTTP-like status code (501)
        status: u16,
        /// Machine-readable set of missing integration prerequisites
        missing: Vec<String>,
    },

    /// The source reports the record as not existing
    ///
    /// Point lookups translate this to `None`; the pull synchronizer
    /// treats it as deleted-upstream.
    #[error("Record not found on source")]
    NotFound,

    /// Network error, rate limit, or 5xx-class response; worth retrying
    #[error("Transient source error (status {status:?}): {message}")]
    Transient {
        /// HTTP status code, where one was received
        status: Option<u16>,
        /// Underlying cause
        message: String,
    },

    /// Non-retryable API failure (auth, 4xx other than 404, contract breach)
    #[error("Source API error (status {status:?}): {message}")]
    Api {
        /// HTTP status code, where one was received
        status: Option<u16>,
        /// Underlying cause
        message: String,
    },

    /// The source answered but its payload could not be decoded
    #[error("Failed to decode source payload: {0}")]
    Decode(String),
}

impl SourceError {
    /// Returns true for errors that a fixed-backoff retry may resolve
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transient { .. })
    }

    /// Returns true for a not-found miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound)
    }

    /// Builds a transient or fatal API error from an HTTP status code
    ///
    /// 404 maps to `NotFound`, 408/429/5xx to `Transient`, everything
    /// else to `Api`.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            404 => SourceError::NotFound,
            408 | 429 => SourceError::Transient {
                status: Some(status),
                message: message.into(),
            },
            s if s >= 500 => SourceError::Transient {
                status: Some(status),
                message: message.into(),
            },
            _ => SourceError::Api {
                status: Some(status),
                message: message.into(),
            },
        }
    }
}

// ============================================================================
// DTOs
// ============================================================================

/// One page of records from a paged listing
#[derive(Debug, Clone)]
pub struct SourcePage {
    /// The normalized records on this page
    pub records: Vec<ExternalRecord>,
    /// Total record count reported by the source, where known
    pub total: Option<u64>,
    /// Whether more pages follow
    pub has_more: bool,
}

/// Outcome of a connectivity check
///
/// Produced by [`ISourceAdapter::test_connection`], which never errors:
/// failures are reported inside this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Whether the source answered successfully
    pub success: bool,
    /// Human-readable outcome description
    pub message: String,
    /// Round-trip latency in milliseconds, when a response arrived
    pub latency_ms: Option<u64>,
}

impl ConnectionStatus {
    /// A successful check
    pub fn ok(message: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            latency_ms: Some(latency_ms),
        }
    }

    /// A failed check
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            latency_ms: None,
        }
    }
}

// ============================================================================
// ISourceAdapter trait
// ============================================================================

/// Port trait for external catalog sources
///
/// ## Implementation Notes
///
/// - `list_skus` must deduplicate, apply the source's rate limit during
///   pagination, and stop at a hard page-count ceiling (logging a warning)
///   rather than looping forever on a misbehaving API.
/// - `get_by_sku` returns `Ok(None)` on a not-found miss; any other
///   failure class is an error.
/// - `get_page` clamps the requested page size to the source's documented
///   maximum.
/// - `count` is cached within one adapter instance's lifetime; sources
///   without a native count endpoint fall back to paginated enumeration.
/// - Adapters issue sequential requests only; callers may share one
///   instance across tasks but must not assume parallel fan-out helps.
#[async_trait::async_trait]
pub trait ISourceAdapter: Send + Sync {
    /// The source this adapter talks to (type + instance)
    fn source(&self) -> &SourceRef;

    /// Fetches every business key from the source, deduplicated
    async fn list_skus(&self) -> Result<HashSet<String>, SourceError>;

    /// Looks up a single record by business key
    ///
    /// Returns `Ok(None)` when the source reports not-found.
    async fn get_by_sku(&self, sku: &str) -> Result<Option<ExternalRecord>, SourceError>;

    /// Fetches one page of records (1-based page number)
    async fn get_page(&self, page: u32, page_size: u32) -> Result<SourcePage, SourceError>;

    /// Returns the total record count on the source
    async fn count(&self) -> Result<u64, SourceError>;

    /// Normalizes a raw payload into the canonical record shape
    ///
    /// Pure and total: absent fields default rather than erroring.
    fn normalize(&self, raw: &serde_json::Value) -> ExternalRecord;

    /// Checks connectivity; never errors
    async fn test_connection(&self) -> ConnectionStatus;

    /// Creates a record on the external source (publication)
    ///
    /// Returns the new external record identifier.
    async fn create_record(&self, record: &CatalogRecord) -> Result<String, SourceError>;
}
