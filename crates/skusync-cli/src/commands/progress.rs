//! Progress command - poll the status and counters of one scan session

use anyhow::{Context, Result};
use clap::Args;

use skusync_core::config::Config;
use skusync_core::domain::newtypes::SessionId;
use skusync_core::usecases::SessionProgressUseCase;

use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct ProgressCommand {
    /// Session ID
    pub session_id: String,
}

impl ProgressCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = format.formatter();

        let session_id = self
            .session_id
            .parse::<SessionId>()
            .context("session id must be a UUID")?;

        let store = super::open_store(config).await?;
        let progress = SessionProgressUseCase::new(store).execute(&session_id).await?;

        let Some(progress) = progress else {
            formatter.error(&format!("No session found with ID: {}", session_id));
            return Ok(());
        };

        if format.is_json() {
            formatter.print_json(&serde_json::to_value(&progress)?);
            return Ok(());
        }

        formatter.success(&format!("Session {}", session_id));
        formatter.info(&format!("Status:    {}", progress.status));
        formatter.info(&format!("Progress:  {:.1}%", progress.percent_complete));
        formatter.info(&format!("Scanned:   {}", progress.total_scanned));
        formatter.info(&format!("Matched:   {}", progress.matched));
        formatter.info(&format!("Unmatched: {}", progress.unmatched));
        formatter.info(&format!("Errors:    {}", progress.errors));

        Ok(())
    }
}
