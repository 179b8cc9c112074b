//! CLI command implementations

use std::sync::Arc;

use anyhow::{Context, Result};

use skusync_core::config::Config;
use skusync_core::domain::newtypes::SourceId;
use skusync_core::domain::record::SourceType;
use skusync_store::{DatabasePool, SqliteStore};

pub mod progress;
pub mod pull;
pub mod resolve;
pub mod results;
pub mod scan;
pub mod sources;

/// Opens the configured database and returns the store
async fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let pool = DatabasePool::new(&config.database.path)
        .await
        .context("Failed to open database")?;
    Ok(Arc::new(SqliteStore::new(pool.pool().clone())))
}

/// Parses a source type name, listing the valid names on failure
fn parse_source_type(name: &str) -> Result<SourceType> {
    name.parse::<SourceType>().with_context(|| {
        let known: Vec<&str> = SourceType::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown source '{}'; valid sources: {}", name, known.join(", "))
    })
}

/// Maps an optional instance selector to a `SourceId`
fn parse_source_id(id: Option<&String>) -> Option<SourceId> {
    id.map(SourceId::new)
}
