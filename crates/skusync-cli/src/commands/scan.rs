//! Scan command - run a reconciliation scan against one source
//!
//! Creates a pending session, executes it in-process with the scan runner,
//! and reports the final counters.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use skusync_core::config::Config;
use skusync_core::domain::session::ScanKind;
use skusync_core::usecases::{SessionProgressUseCase, StartScanUseCase};
use skusync_scan::ScanRunner;

use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Source to scan: erp_a, erp_b, erp_c, or storefront
    pub source: String,

    /// Instance selector for multi-instance sources (storefronts)
    #[arg(long)]
    pub source_id: Option<String>,

    /// Algorithm: link_scan, missing_internal, or missing_external
    #[arg(long, default_value = "link_scan")]
    pub kind: String,
}

impl ScanCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = format.formatter();

        let source_type = super::parse_source_type(&self.source)?;
        let source_id = super::parse_source_id(self.source_id.as_ref());
        let kind = self
            .kind
            .parse::<ScanKind>()
            .context("valid kinds: link_scan, missing_internal, missing_external")?;

        let store = super::open_store(config).await?;

        let session_id = StartScanUseCase::new(store.clone())
            .execute(source_type, source_id, kind)
            .await?;

        info!(session_id = %session_id, "Session created, executing");
        if !format.is_json() {
            formatter.info(&format!("Session {} created, scanning...", session_id));
        }

        ScanRunner::new(config.clone(), store.clone(), store.clone())
            .execute(session_id)
            .await?;

        let progress = SessionProgressUseCase::new(store)
            .execute(&session_id)
            .await?
            .context("session vanished during execution")?;

        if format.is_json() {
            let mut json = serde_json::to_value(&progress)?;
            if let Some(map) = json.as_object_mut() {
                map.insert(
                    "session_id".to_string(),
                    serde_json::Value::String(session_id.to_string()),
                );
            }
            formatter.print_json(&json);
            return Ok(());
        }

        if progress.status == "completed" {
            formatter.success(&format!("Scan completed ({})", kind));
        } else {
            // The failed status already embeds the error message.
            formatter.error(&format!("Scan did not complete: {}", progress.status));
        }

        formatter.info(&format!("Scanned:   {}", progress.total_scanned));
        formatter.info(&format!("Matched:   {}", progress.matched));
        formatter.info(&format!("Unmatched: {}", progress.unmatched));
        if progress.errors > 0 {
            formatter.info(&format!("Errors:    {}", progress.errors));
        }
        formatter.info("");
        formatter.info(&format!(
            "Use 'skusync results {}' to browse the results.",
            session_id
        ));

        Ok(())
    }
}
