//! Field comparison between internal and external records
//!
//! Compares the fixed list of reconciled fields using trimmed string
//! equality. Numeric fields are compared through their canonical formatting
//! so `1` and `1.0` are the same value, and a blank string counts as
//! absent. Everything here is pure; persistence of the resulting diffs is
//! the caller's concern.

use skusync_core::domain::conflict::FieldDiff;
use skusync_core::domain::record::{CatalogRecord, ExternalRecord};

/// Every field the resolver reconciles, in display order
pub const ALL_FIELDS: &[&str] = &[
    "name",
    "code",
    "manufacturer",
    "description",
    "unit",
    "price_net",
    "stock",
    "active",
];

/// The subset compared during link scans (cheap, display-relevant fields)
pub const SCAN_FIELDS: &[&str] = &["name", "code", "manufacturer"];

/// A typed field value extracted from either side
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free-text field; `None` when absent
    Text(Option<String>),
    /// Numeric field; `None` when absent
    Number(Option<f64>),
    /// Boolean field
    Flag(bool),
}

impl FieldValue {
    /// Canonical string form used for comparison and for diff display
    ///
    /// Text is trimmed, and a value that is blank after trimming counts as
    /// absent. Numbers go through `{}` formatting, which drops a trailing
    /// `.0` and makes `1` and `1.0` equal.
    pub fn canonical(&self) -> Option<String> {
        match self {
            FieldValue::Text(v) => v
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            FieldValue::Number(v) => v.map(|n| format!("{n}")),
            FieldValue::Flag(v) => Some(v.to_string()),
        }
    }

    /// JSON form, for building update sets
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(_) => match self.canonical() {
                Some(s) => serde_json::Value::String(s),
                None => serde_json::Value::Null,
            },
            FieldValue::Number(Some(n)) => serde_json::json!(n),
            FieldValue::Number(None) => serde_json::Value::Null,
            FieldValue::Flag(b) => serde_json::Value::Bool(*b),
        }
    }
}

/// Extracts one reconciled field from the internal record
pub fn internal_value(record: &CatalogRecord, field: &str) -> FieldValue {
    match field {
        "name" => FieldValue::Text(Some(record.name.clone())),
        "code" => FieldValue::Text(record.code.clone()),
        "manufacturer" => FieldValue::Text(record.manufacturer.clone()),
        "description" => FieldValue::Text(record.description.clone()),
        "unit" => FieldValue::Text(record.unit.clone()),
        "price_net" => FieldValue::Number(record.price_net),
        "stock" => FieldValue::Number(record.stock),
        "active" => FieldValue::Flag(record.active),
        _ => FieldValue::Text(None),
    }
}

/// Extracts one reconciled field from the external record
pub fn external_value(record: &ExternalRecord, field: &str) -> FieldValue {
    match field {
        "name" => FieldValue::Text(record.name.clone()),
        "code" => FieldValue::Text(record.code.clone()),
        "manufacturer" => FieldValue::Text(record.manufacturer.clone()),
        "description" => FieldValue::Text(record.description.clone()),
        "unit" => FieldValue::Text(record.unit.clone()),
        "price_net" => FieldValue::Number(record.price_net),
        "stock" => FieldValue::Number(record.stock),
        "active" => FieldValue::Flag(record.active),
        _ => FieldValue::Text(None),
    }
}

/// Compares the given fields, returning one diff per differing field
pub fn diff_fields(
    internal: &CatalogRecord,
    external: &ExternalRecord,
    fields: &[&str],
) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();
    for field in fields {
        let lhs = internal_value(internal, field).canonical();
        let rhs = external_value(external, field).canonical();
        if lhs != rhs {
            diffs.push(FieldDiff::new(*field, lhs.as_deref(), rhs.as_deref()));
        }
    }
    diffs
}

/// Compares the full reconciled field list
pub fn diff_records(internal: &CatalogRecord, external: &ExternalRecord) -> Vec<FieldDiff> {
    diff_fields(internal, external, ALL_FIELDS)
}

/// Compares only the link-scan field subset
pub fn diff_scan_fields(internal: &CatalogRecord, external: &ExternalRecord) -> Vec<FieldDiff> {
    diff_fields(internal, external, SCAN_FIELDS)
}
