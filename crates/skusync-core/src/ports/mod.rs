//! Port definitions (trait seams)
//!
//! Ports are the boundary between the domain core and the adapter crates.
//! Driven ports here: the source adapter (external ERP/storefront APIs),
//! the scan store (session + result persistence), and the catalog
//! repository (internal records and links).

pub mod catalog;
pub mod scan_store;
pub mod source_adapter;

pub use catalog::ICatalogRepository;
pub use scan_store::{IScanStore, ResultFilter, ResultPage};
pub use source_adapter::{ConnectionStatus, ISourceAdapter, SourceError, SourcePage};
