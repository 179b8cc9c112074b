//! Catalog repository port (driven/secondary port)
//!
//! Persistence seam for internal catalog records and their cross-system
//! links. Generic CRUD for unrelated entities lives outside this core;
//! only what reconciliation and resolution need is exposed here.

use crate::domain::newtypes::{RecordId, Sku};
use crate::domain::record::{CatalogRecord, SourceLink, SourceRef};

/// Port trait for internal catalog access
///
/// ## Implementation Notes
///
/// - `list_records` streams in stable id order so duplicate-SKU handling
///   (first-wins) is deterministic across runs.
/// - Link and conflict-flag writes must be atomic with the field updates
///   they accompany: applying an external update clears the conflict flag
///   and timestamp in the same transaction.
#[async_trait::async_trait]
pub trait ICatalogRepository: Send + Sync {
    /// Loads all catalog records with their links
    ///
    /// Callers iterate this in fixed-size batches; blank-SKU exclusion is
    /// the algorithms' responsibility, not the repository's.
    async fn list_records(&self) -> anyhow::Result<Vec<CatalogRecord>>;

    /// Loads the records linked to the given source, with their links
    async fn list_linked_records(&self, source: &SourceRef) -> anyhow::Result<Vec<CatalogRecord>>;

    /// Loads a single record by id
    async fn get_record(&self, id: &RecordId) -> anyhow::Result<Option<CatalogRecord>>;

    /// Loads the first record carrying the given SKU, in stable id order
    async fn get_record_by_sku(&self, sku: &Sku) -> anyhow::Result<Option<CatalogRecord>>;

    /// Inserts a new record (used for import candidates; callers pass
    /// `RecordStatus::Draft`)
    async fn insert_record(&self, record: &CatalogRecord) -> anyhow::Result<()>;

    /// Applies a partial field update to a record
    ///
    /// `fields` maps column-level field names to new values; unknown
    /// fields are rejected by the implementation.
    async fn update_record_fields(
        &self,
        id: &RecordId,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> anyhow::Result<()>;

    /// Inserts or replaces the link for (record, source)
    async fn upsert_link(&self, link: &SourceLink) -> anyhow::Result<()>;

    /// Removes the link for (record, source), if present
    async fn clear_link(&self, record_id: &RecordId, source: &SourceRef) -> anyhow::Result<()>;
}
