//! Sources command - inspect configured external sources

use anyhow::Result;
use clap::Subcommand;

use skusync_core::config::Config;
use skusync_core::domain::newtypes::SourceId;
use skusync_core::domain::record::{SourceRef, SourceType};
use skusync_core::ports::source_adapter::ConnectionStatus;
use skusync_sources::build_adapter;

use crate::output::OutputFormat;

#[derive(Debug, Subcommand)]
pub enum SourcesCommand {
    /// Test connectivity to every configured source
    Test,
}

impl SourcesCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        match self {
            SourcesCommand::Test => self.execute_test(config, format).await,
        }
    }

    async fn execute_test(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = format.formatter();

        let targets = configured_sources(config);
        if targets.is_empty() {
            formatter.warn("No sources configured");
            return Ok(());
        }

        let mut checks: Vec<(SourceRef, ConnectionStatus)> = Vec::with_capacity(targets.len());
        for source in targets {
            let status = match build_adapter(config, source.source_type, source.source_id.as_ref())
            {
                Ok(adapter) => adapter.test_connection().await,
                Err(err) => ConnectionStatus::failed(err.to_string()),
            };
            checks.push((source, status));
        }

        if format.is_json() {
            let rows: Vec<serde_json::Value> = checks
                .iter()
                .map(|(source, status)| {
                    serde_json::json!({
                        "source": source.to_string(),
                        "success": status.success,
                        "message": status.message,
                        "latency_ms": status.latency_ms,
                    })
                })
                .collect();
            formatter.print_json(&serde_json::json!({ "sources": rows }));
            return Ok(());
        }

        for (source, status) in &checks {
            let latency = status
                .latency_ms
                .map(|ms| format!(" ({ms} ms)"))
                .unwrap_or_default();
            if status.success {
                formatter.success(&format!("{}: {}{}", source, status.message, latency));
            } else {
                formatter.error(&format!("{}: {}", source, status.message));
            }
        }

        Ok(())
    }
}

/// Enumerates the sources the configuration declares
///
/// The placeholder ERP is always listed so its not-implemented state shows
/// up in the check output.
fn configured_sources(config: &Config) -> Vec<SourceRef> {
    let mut sources = Vec::new();
    if config.sources.erp_a.is_some() {
        sources.push(SourceRef::new(SourceType::ErpA, None));
    }
    if config.sources.erp_b.is_some() {
        sources.push(SourceRef::new(SourceType::ErpB, None));
    }
    sources.push(SourceRef::new(SourceType::ErpC, None));
    for shop in &config.sources.storefronts {
        sources.push(SourceRef::new(
            SourceType::Storefront,
            Some(SourceId::new(&shop.id)),
        ));
    }
    sources
}
