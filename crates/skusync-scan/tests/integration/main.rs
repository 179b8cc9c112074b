//! Integration tests for the scan crate
//!
//! All tests run the real algorithms against an in-memory SQLite store and
//! a deterministic in-memory source adapter.

mod common;
mod test_pull;
mod test_resolve;
mod test_scanner;
