//! Pull command - synchronize already-linked records from one source

use anyhow::Result;
use clap::Args;
use tracing::info;

use skusync_core::config::Config;
use skusync_scan::PullSynchronizer;

use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct PullCommand {
    /// Source to pull from: erp_a, erp_b, erp_c, or storefront
    pub source: String,

    /// Instance selector for multi-instance sources (storefronts)
    #[arg(long)]
    pub source_id: Option<String>,
}

impl PullCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = format.formatter();

        let source_type = super::parse_source_type(&self.source)?;
        let source_id = super::parse_source_id(self.source_id.as_ref());

        let adapter =
            skusync_sources::build_adapter(config, source_type, source_id.as_ref())?;
        let store = super::open_store(config).await?;
        let policy = config.conflict_policy();

        info!(source = %adapter.source(), policy = %policy, "Pull requested");

        let summary = PullSynchronizer::new(store, policy)
            .pull(&adapter)
            .await?;

        if format.is_json() {
            formatter.print_json(&serde_json::to_value(&summary)?);
            return Ok(());
        }

        if summary.checked == 0 {
            formatter.success("No linked records to pull");
            return Ok(());
        }

        formatter.success(&format!(
            "Pull finished: {} record{} checked",
            summary.checked,
            if summary.checked == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("Updated:    {}", summary.updated));
        formatter.info(&format!("Conflicted: {}", summary.conflicted));
        formatter.info(&format!("Unlinked:   {}", summary.unlinked));
        if summary.errors > 0 {
            formatter.info(&format!("Errors:     {}", summary.errors));
        }

        Ok(())
    }
}
