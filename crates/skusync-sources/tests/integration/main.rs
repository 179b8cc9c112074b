//! Integration tests for skusync-sources
//!
//! Uses wiremock to simulate the external APIs and verifies end-to-end
//! adapter behavior: pagination, SKU lookup, error classification,
//! multilingual extraction, and the placeholder semantics.

mod common;

mod test_erp_a;
mod test_erp_b;
mod test_storefront;
