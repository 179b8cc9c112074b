//! Results command - browse the results of one scan session

use anyhow::{Context, Result};
use clap::Args;

use skusync_core::domain::newtypes::SessionId;
use skusync_core::domain::scan_result::{MatchStatus, ResolutionStatus};
use skusync_core::ports::scan_store::{IScanStore, ResultFilter};
use skusync_core::config::Config;

use crate::output::{truncate_id, OutputFormat};

#[derive(Debug, Args)]
pub struct ResultsCommand {
    /// Session ID
    pub session_id: String,

    /// Filter by classification: matched, unmatched, conflict, already_linked
    #[arg(long)]
    pub match_status: Option<String>,

    /// Filter by resolution: pending, linked, created, ignored, error
    #[arg(long)]
    pub resolution: Option<String>,

    /// Free-text search over SKU and name
    #[arg(long)]
    pub search: Option<String>,

    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Results per page
    #[arg(long, default_value_t = 50)]
    pub per_page: u32,
}

impl ResultsCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = format.formatter();

        let session_id = self
            .session_id
            .parse::<SessionId>()
            .context("session id must be a UUID")?;

        let mut filter =
            ResultFilter::for_session(session_id).with_page(self.page, self.per_page);
        if let Some(status) = &self.match_status {
            filter = filter.with_match_status(
                status
                    .parse::<MatchStatus>()
                    .context("valid values: matched, unmatched, conflict, multiple, already_linked")?,
            );
        }
        if let Some(status) = &self.resolution {
            filter = filter.with_resolution_status(
                status
                    .parse::<ResolutionStatus>()
                    .context("valid values: pending, linked, created, ignored, error")?,
            );
        }
        if let Some(term) = &self.search {
            filter = filter.with_search(term);
        }

        let store = super::open_store(config).await?;
        let page = store
            .query_results(&filter)
            .await
            .context("Failed to query scan results")?;

        if format.is_json() {
            let rows: Vec<serde_json::Value> = page
                .results
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.id().to_string(),
                        "sku": r.sku(),
                        "name": r.name(),
                        "external_id": r.external_id(),
                        "internal_record_id": r.internal_record_id().map(|id| id.to_string()),
                        "match_status": r.match_status().to_string(),
                        "resolution_status": r.resolution_status().to_string(),
                        "diff": r.diff(),
                    })
                })
                .collect();
            formatter.print_json(&serde_json::json!({
                "total": page.total,
                "page": self.page,
                "per_page": self.per_page,
                "results": rows,
            }));
            return Ok(());
        }

        if page.results.is_empty() {
            formatter.success("No results match the filter");
            return Ok(());
        }

        formatter.success(&format!(
            "{} result{} (page {}, showing {})",
            page.total,
            if page.total == 1 { "" } else { "s" },
            self.page,
            page.results.len()
        ));
        formatter.info("");
        formatter.info("  ID (short)     SKU               Match           Resolution  Name");
        formatter.info("  -------------- ----------------- --------------- ----------- ----");

        for result in &page.results {
            formatter.info(&format!(
                "  {:<14} {:<17} {:<15} {:<11} {}",
                truncate_id(result.id().to_string(), 14),
                result.sku(),
                result.match_status().to_string(),
                result.resolution_status().to_string(),
                result.name(),
            ));
        }

        formatter.info("");
        formatter.info("Use 'skusync resolve <id> --action <link|create|publish|ignore>' to act on a result.");

        Ok(())
    }
}
