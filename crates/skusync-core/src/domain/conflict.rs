//! Field-level conflicts and resolution policies
//!
//! A conflict is a detected disagreement between the internal and external
//! representation of a linked record, recorded per field so operators can
//! review exactly what differs.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// One field-level difference between the internal and external record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Name of the compared field (e.g. "name", "code", "manufacturer")
    pub field: String,
    /// The internally stored value, if any
    pub internal: Option<String>,
    /// The externally reported value, if any
    pub external: Option<String>,
}

impl FieldDiff {
    /// Creates a field diff
    pub fn new(field: impl Into<String>, internal: Option<&str>, external: Option<&str>) -> Self {
        Self {
            field: field.into(),
            internal: internal.map(str::to_string),
            external: external.map(str::to_string),
        }
    }
}

impl std::fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {:?} != {:?}",
            self.field,
            self.internal.as_deref().unwrap_or(""),
            self.external.as_deref().unwrap_or("")
        )
    }
}

/// Which side wins when a linked record's representations disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Always apply the external representation
    ExternalWins,
    /// Never apply from the pull path; this is not a conflict
    InternalWins,
    /// Detect differences and leave them for operator review
    Manual,
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConflictPolicy::ExternalWins => "external_wins",
            ConflictPolicy::InternalWins => "internal_wins",
            ConflictPolicy::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ConflictPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external_wins" => Ok(ConflictPolicy::ExternalWins),
            "internal_wins" => Ok(ConflictPolicy::InternalWins),
            "manual" => Ok(ConflictPolicy::Manual),
            other => Err(DomainError::UnknownValue {
                kind: "conflict policy".to_string(),
                value: other.to_string(),
            }),
        }
    }
}
