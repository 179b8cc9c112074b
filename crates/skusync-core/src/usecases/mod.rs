//! Use cases (application services)
//!
//! Thin orchestration over the port traits: starting scans, reporting
//! progress, and applying operator resolutions to scan results. The scan
//! algorithms themselves live in the scan engine crate; these use cases are
//! the surface the CLI (and any future UI) talks to.

pub mod progress;
pub mod resolve_result;
pub mod start_scan;

pub use progress::{SessionProgress, SessionProgressUseCase};
pub use resolve_result::ResolveResultUseCase;
pub use start_scan::StartScanUseCase;
