//! skusync-sources - External source adapters
//!
//! One [`ISourceAdapter`] implementation per external system type:
//! - [`erp_a`]: key/secret REST ERP with page-number pagination
//! - [`erp_b`]: token-header ERP with offset pagination and strict rate limits
//! - [`erp_c`]: placeholder for a not-yet-implemented integration
//! - [`storefront`]: multi-tenant storefront with multilingual fields
//!
//! [`build_adapter`] is the single construction point: it maps a source
//! reference to the right adapter, or a [`SourceError::Config`] when the
//! source is not configured.

use std::sync::Arc;

use skusync_core::config::Config;
use skusync_core::domain::newtypes::SourceId;
use skusync_core::domain::record::SourceType;
use skusync_core::ports::source_adapter::{ISourceAdapter, SourceError};

pub mod erp_a;
pub mod erp_b;
pub mod erp_c;
pub mod http;
pub mod pacer;
pub mod storefront;

pub use pacer::{RequestPacer, MAX_PAGES};

/// Builds the adapter for a source reference from configuration
///
/// # Arguments
/// * `config` - The loaded application configuration
/// * `source_type` - Which kind of external system
/// * `source_id` - Which instance, for multi-instance types (storefronts)
pub fn build_adapter(
    config: &Config,
    source_type: SourceType,
    source_id: Option<&SourceId>,
) -> Result<Arc<dyn ISourceAdapter>, SourceError> {
    match source_type {
        SourceType::ErpA => {
            let cfg = config
                .sources
                .erp_a
                .as_ref()
                .ok_or_else(|| SourceError::Config("erp_a is not configured".to_string()))?;
            Ok(Arc::new(erp_a::ErpAAdapter::new(cfg)?))
        }
        SourceType::ErpB => {
            let cfg = config
                .sources
                .erp_b
                .as_ref()
                .ok_or_else(|| SourceError::Config("erp_b is not configured".to_string()))?;
            Ok(Arc::new(erp_b::ErpBAdapter::new(cfg)?))
        }
        SourceType::ErpC => Ok(Arc::new(erp_c::ErpCAdapter::new())),
        SourceType::Storefront => {
            let id = source_id.ok_or_else(|| {
                SourceError::Config("storefront scans need a source id".to_string())
            })?;
            let cfg = config.storefront(id.as_str()).ok_or_else(|| {
                SourceError::Config(format!("storefront '{id}' is not configured"))
            })?;
            Ok(Arc::new(storefront::StorefrontAdapter::new(cfg)?))
        }
    }
}
