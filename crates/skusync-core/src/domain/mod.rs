//! Domain entities and value types
//!
//! Pure business objects with no I/O dependencies. Adapters map these to
//! wire formats and database rows; use cases orchestrate them through ports.

pub mod conflict;
pub mod errors;
pub mod newtypes;
pub mod record;
pub mod scan_result;
pub mod session;

pub use conflict::{ConflictPolicy, FieldDiff};
pub use errors::DomainError;
pub use newtypes::{RecordId, ResultId, SessionId, Sku, SourceId};
pub use record::{CatalogRecord, ExternalRecord, RecordStatus, SourceLink, SourceRef, SourceType};
pub use scan_result::{MatchStatus, ResolutionStatus, ScanResult};
pub use session::{ScanKind, ScanSession, ScanStatus};
