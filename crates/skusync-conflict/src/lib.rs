//! skusync-conflict - Field-level conflict detection and policy resolution
//!
//! Provides:
//! - Trimmed-equality field comparison between internal and external records
//! - Pure, side-effect-free policy decisions (external wins / internal wins /
//!   manual)
//! - The update set a caller applies when a decision says to update

pub mod diff;
pub mod resolver;

pub use diff::{diff_records, diff_scan_fields, FieldValue, SCAN_FIELDS};
pub use resolver::{decide, Decision, UpdateSet};
