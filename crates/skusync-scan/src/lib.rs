//! skusync-scan - reconciliation algorithms and job execution
//!
//! This crate turns a pending [`ScanSession`](skusync_core::domain::session::ScanSession)
//! into persisted, classified results:
//!
//! - [`Scanner`] runs the three reconciliation algorithms (link scan,
//!   missing-in-internal, missing-in-external) in fixed-size batches with
//!   cooperative cancellation.
//! - [`ScanRunner`] executes one session end to end: uniqueness lock,
//!   adapter setup, retry on transient setup errors, timeout ceiling, and
//!   guaranteed finalization.
//! - [`PullSynchronizer`] re-fetches already-linked records and applies the
//!   configured conflict policy.

pub mod puller;
pub mod runner;
pub mod scanner;

pub use puller::{PullSummary, PullSynchronizer};
pub use runner::{AdapterFactory, ScanRunner};
pub use scanner::{ScanOutcome, Scanner, DEFAULT_BATCH_SIZE};
