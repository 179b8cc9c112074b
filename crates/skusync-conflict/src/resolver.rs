//! Policy decisions for linked-record synchronization
//!
//! `decide` is pure: it looks at one internal record, one external record
//! and the configured policy, and says whether the internal side should be
//! updated, which fields to write, and which conflicts (if any) to record.
//! Applying the decision (field writes, conflict flags) is the pull
//! synchronizer's job.

use serde_json::Value;
use tracing::trace;

use skusync_core::domain::conflict::{ConflictPolicy, FieldDiff};
use skusync_core::domain::record::{CatalogRecord, ExternalRecord};

use crate::diff::{diff_records, external_value};

/// The field writes a decision asks the caller to apply
///
/// Keys are internal column names, values the external side's canonical
/// JSON value. Empty when nothing should change.
pub type UpdateSet = serde_json::Map<String, Value>;

/// Outcome of evaluating one linked record pair against the policy
#[derive(Debug, Clone)]
pub struct Decision {
    /// Whether the internal record should be updated now
    pub should_update: bool,
    /// Human-readable explanation, logged and shown in `--json` output
    pub reason: String,
    /// Conflicts to record on the link; `None` means none (including for
    /// internal-wins, which never reports conflicts)
    pub conflicts: Option<Vec<FieldDiff>>,
    /// Field writes to apply when `should_update` is set
    pub update: UpdateSet,
}

/// Evaluates the policy for one internal/external record pair
pub fn decide(
    policy: ConflictPolicy,
    internal: &CatalogRecord,
    external: &ExternalRecord,
) -> Decision {
    let diffs = diff_records(internal, external);
    trace!(
        policy = %policy,
        sku = %internal.sku_raw,
        differing = diffs.len(),
        "Evaluating conflict policy"
    );

    match policy {
        ConflictPolicy::ExternalWins => Decision {
            should_update: true,
            reason: if diffs.is_empty() {
                "external wins; fields already equal".to_string()
            } else {
                format!("external wins; updating {} field(s)", diffs.len())
            },
            conflicts: None,
            update: update_set(external, &diffs),
        },
        ConflictPolicy::InternalWins => Decision {
            should_update: false,
            reason: "internal wins; external changes ignored".to_string(),
            conflicts: None,
            update: UpdateSet::new(),
        },
        ConflictPolicy::Manual => {
            if diffs.is_empty() {
                Decision {
                    should_update: true,
                    reason: "no differences; nothing to decide".to_string(),
                    conflicts: None,
                    update: UpdateSet::new(),
                }
            } else {
                Decision {
                    should_update: false,
                    reason: format!("{} field(s) differ; awaiting manual review", diffs.len()),
                    conflicts: Some(diffs),
                    update: UpdateSet::new(),
                }
            }
        }
    }
}

/// Builds the field writes for the differing fields, from the external side
fn update_set(external: &ExternalRecord, diffs: &[FieldDiff]) -> UpdateSet {
    diffs
        .iter()
        .map(|d| (d.field.clone(), external_value(external, &d.field).to_json()))
        .collect()
}
