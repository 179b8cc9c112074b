//! Catalog records, canonical external records, and source links
//!
//! `CatalogRecord` is the internally stored product. `ExternalRecord` is the
//! normalized, transient shape every source adapter produces from its raw
//! payload. `SourceLink` is the persisted association between an internal
//! record and an external record's identifier within one source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conflict::FieldDiff;
use super::errors::DomainError;
use super::newtypes::{RecordId, SourceId};

// ============================================================================
// SourceType / SourceRef
// ============================================================================

/// The kind of external system a record or link belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Paginated REST ERP back-office (key/secret auth)
    ErpA,
    /// Token-based ERP back-office with strict rate limits
    ErpB,
    /// ERP integration that is not implemented yet (placeholder adapter)
    ErpC,
    /// Multi-tenant e-commerce storefront
    Storefront,
}

impl SourceType {
    /// All known source types
    pub const ALL: [SourceType; 4] = [
        SourceType::ErpA,
        SourceType::ErpB,
        SourceType::ErpC,
        SourceType::Storefront,
    ];

    /// Stable string name used in storage and on the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::ErpA => "erp_a",
            SourceType::ErpB => "erp_b",
            SourceType::ErpC => "erp_c",
            SourceType::Storefront => "storefront",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "erp_a" => Ok(SourceType::ErpA),
            "erp_b" => Ok(SourceType::ErpB),
            "erp_c" => Ok(SourceType::ErpC),
            "storefront" => Ok(SourceType::Storefront),
            other => Err(DomainError::UnknownValue {
                kind: "source type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// A fully qualified source: type plus optional instance selector
///
/// Two links refer to the same source exactly when both components match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Which kind of external system
    pub source_type: SourceType,
    /// Which instance of it, where the type is multi-instance
    pub source_id: Option<SourceId>,
}

impl SourceRef {
    /// Creates a source reference
    pub fn new(source_type: SourceType, source_id: Option<SourceId>) -> Self {
        Self {
            source_type,
            source_id,
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_id {
            Some(id) => write!(f, "{}[{}]", self.source_type, id),
            None => write!(f, "{}", self.source_type),
        }
    }
}

// ============================================================================
// ExternalRecord
// ============================================================================

/// Canonical, normalized shape of one external product record
///
/// This is a port-level DTO, not a persisted entity. Adapters are required
/// to produce it totally: any field the raw payload lacks defaults to
/// `None`/`false` rather than failing normalization. The untouched raw
/// payload is carried along for debugging and snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRecord {
    /// Provider-specific record identifier
    pub external_id: String,
    /// Business key, if the source reports one
    pub sku: Option<String>,
    /// Product name (first available language for multilingual sources)
    pub name: Option<String>,
    /// Long description
    pub description: Option<String>,
    /// Identifying code (e.g. barcode / EAN)
    pub code: Option<String>,
    /// Net price
    pub price_net: Option<f64>,
    /// Gross price
    pub price_gross: Option<f64>,
    /// Stock quantity
    pub stock: Option<f64>,
    /// Sales unit (e.g. "pcs", "kg")
    pub unit: Option<String>,
    /// Weight
    pub weight: Option<f64>,
    /// Tax rate in percent
    pub tax_rate: Option<f64>,
    /// Whether the record is active/sellable on the source
    pub active: bool,
    /// Manufacturer name
    pub manufacturer: Option<String>,
    /// Group or category reference on the source
    pub group_ref: Option<String>,
    /// Which source this record came from
    pub source: SourceRef,
    /// The untouched raw payload, for debugging and display snapshots
    pub raw: serde_json::Value,
}

impl ExternalRecord {
    /// Creates an empty record for the given source and external id
    ///
    /// All optional fields default to `None` and `active` to `false`;
    /// adapters fill in whatever the raw payload provides.
    pub fn empty(source: SourceRef, external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            sku: None,
            name: None,
            description: None,
            code: None,
            price_net: None,
            price_gross: None,
            stock: None,
            unit: None,
            weight: None,
            tax_rate: None,
            active: false,
            manufacturer: None,
            group_ref: None,
            source,
            raw: serde_json::Value::Null,
        }
    }

    /// Snapshot of the display-relevant fields, for persistence on results
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "external_id": self.external_id,
            "sku": self.sku,
            "name": self.name,
            "code": self.code,
            "manufacturer": self.manufacturer,
            "price_net": self.price_net,
            "price_gross": self.price_gross,
            "stock": self.stock,
            "unit": self.unit,
            "active": self.active,
        })
    }
}

// ============================================================================
// CatalogRecord
// ============================================================================

/// Lifecycle status of an internal catalog record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Created but not yet released (records created from import candidates
    /// start here)
    Draft,
    /// Released and maintained
    Active,
    /// Soft-retired
    Archived,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordStatus::Draft => "draft",
            RecordStatus::Active => "active",
            RecordStatus::Archived => "archived",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(RecordStatus::Draft),
            "active" => Ok(RecordStatus::Active),
            "archived" => Ok(RecordStatus::Archived),
            other => Err(DomainError::UnknownValue {
                kind: "record status".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// An internally stored product record
///
/// The SKU is kept as a raw string here because legacy data may contain
/// blank keys; such records are excluded from reconciliation via
/// [`CatalogRecord::sku`], which validates on access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Unique identifier
    pub id: RecordId,
    /// Business key as stored (may be blank on legacy rows)
    pub sku_raw: String,
    /// Product name
    pub name: String,
    /// Identifying code (e.g. barcode / EAN)
    pub code: Option<String>,
    /// Long description
    pub description: Option<String>,
    /// Manufacturer name
    pub manufacturer: Option<String>,
    /// Net price
    pub price_net: Option<f64>,
    /// Stock quantity
    pub stock: Option<f64>,
    /// Sales unit
    pub unit: Option<String>,
    /// Whether the record is active
    pub active: bool,
    /// Lifecycle status
    pub status: RecordStatus,
    /// Persisted cross-system links
    pub links: Vec<SourceLink>,
}

impl CatalogRecord {
    /// Returns the validated SKU, or `None` for blank keys
    pub fn sku(&self) -> Option<super::newtypes::Sku> {
        super::newtypes::Sku::new(self.sku_raw.clone()).ok()
    }

    /// The one explicit "already linked" predicate: true when a link row
    /// exists for exactly this source (type and instance)
    pub fn is_linked_to(&self, source: &SourceRef) -> bool {
        self.links.iter().any(|l| l.source == *source)
    }

    /// Returns the link for the given source, if present
    pub fn link_for(&self, source: &SourceRef) -> Option<&SourceLink> {
        self.links.iter().find(|l| l.source == *source)
    }

    /// Snapshot of the display-relevant fields, for persistence on results
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "sku": self.sku_raw,
            "name": self.name,
            "code": self.code,
            "manufacturer": self.manufacturer,
            "price_net": self.price_net,
            "stock": self.stock,
            "unit": self.unit,
            "active": self.active,
            "status": self.status,
        })
    }

    /// Snapshot of all existing links, carried on publication candidates
    pub fn links_snapshot(&self) -> serde_json::Value {
        serde_json::json!(self
            .links
            .iter()
            .map(|l| {
                serde_json::json!({
                    "source": l.source.to_string(),
                    "external_id": l.external_id,
                    "synced": l.synced,
                })
            })
            .collect::<Vec<_>>())
    }
}

// ============================================================================
// SourceLink
// ============================================================================

/// A persisted association between an internal record and one external record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLink {
    /// The internal record this link belongs to
    pub record_id: RecordId,
    /// Which source the link points into
    pub source: SourceRef,
    /// The external record's identifier within that source
    pub external_id: String,
    /// Whether the last pull found the two sides in sync
    pub synced: bool,
    /// When the link was last synchronized
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Whether unresolved field-level conflicts are recorded on this link
    pub has_conflicts: bool,
    /// The recorded conflicts, when `has_conflicts` is set
    pub conflicts: Option<Vec<FieldDiff>>,
    /// When the conflicts were detected
    pub conflicts_detected_at: Option<DateTime<Utc>>,
}

impl SourceLink {
    /// Creates a fresh, unsynced link
    pub fn new(record_id: RecordId, source: SourceRef, external_id: impl Into<String>) -> Self {
        Self {
            record_id,
            source,
            external_id: external_id.into(),
            synced: false,
            last_synced_at: None,
            has_conflicts: false,
            conflicts: None,
            conflicts_detected_at: None,
        }
    }

    /// Marks the link synced now and clears any recorded conflicts
    pub fn mark_synced(&mut self) {
        self.synced = true;
        self.last_synced_at = Some(Utc::now());
        self.has_conflicts = false;
        self.conflicts = None;
        self.conflicts_detected_at = None;
    }

    /// Records field-level conflicts detected now
    pub fn record_conflicts(&mut self, conflicts: Vec<FieldDiff>) {
        self.has_conflicts = true;
        self.conflicts = Some(conflicts);
        self.conflicts_detected_at = Some(Utc::now());
    }
}
