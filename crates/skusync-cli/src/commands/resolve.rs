//! Resolve command - apply an operator action to one scan result
//!
//! Actions:
//! - `link`: attach the result to an existing internal record
//! - `create`: create an internal draft record from an import candidate
//! - `publish`: create the record on the external source
//! - `ignore`: dismiss the result

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use skusync_core::config::Config;
use skusync_core::domain::newtypes::{RecordId, ResultId};
use skusync_core::ports::scan_store::IScanStore;
use skusync_core::usecases::ResolveResultUseCase;

use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct ResolveCommand {
    /// Result ID
    pub result_id: String,

    /// Action: link, create, publish, or ignore
    #[arg(long)]
    pub action: String,

    /// Internal record ID (required for --action link)
    #[arg(long)]
    pub record: Option<String>,
}

impl ResolveCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = format.formatter();

        let result_id = self
            .result_id
            .parse::<ResultId>()
            .context("result id must be a UUID")?;

        let store = super::open_store(config).await?;
        let usecase = ResolveResultUseCase::new(store.clone(), store.clone());

        match self.action.as_str() {
            "link" => {
                let record = self
                    .record
                    .as_ref()
                    .context("--action link needs --record <record-id>")?;
                let record_id = record
                    .parse::<RecordId>()
                    .context("record id must be a UUID")?;
                usecase.link(&result_id, &record_id).await?;
            }
            "create" => {
                usecase.create_from(&result_id).await?;
            }
            "publish" => {
                // Publication needs the adapter for the result's source.
                let result = store
                    .get_result(&result_id)
                    .await?
                    .with_context(|| format!("no result found with ID: {result_id}"))?;
                let session = store
                    .get_session(result.session_id())
                    .await?
                    .with_context(|| format!("session {} not found", result.session_id()))?;
                let source = session.source();
                let adapter = skusync_sources::build_adapter(
                    config,
                    source.source_type,
                    source.source_id.as_ref(),
                )?;
                usecase.publish(&result_id, adapter).await?;
            }
            "ignore" => {
                usecase.ignore(&result_id).await?;
            }
            other => {
                formatter.error(&format!(
                    "Unknown action: '{}'. Valid actions: link, create, publish, ignore",
                    other
                ));
                return Ok(());
            }
        }

        info!(result_id = %result_id, action = %self.action, "Result resolved");

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "result_id": result_id.to_string(),
                "action": self.action,
            }));
        } else {
            formatter.success(&format!("Result resolved: {}", self.action));
        }

        Ok(())
    }
}
