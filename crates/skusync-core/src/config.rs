//! Configuration module for skusync.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, and defaults. Source credentials are
//! supplied here by the deployment; how they are obtained or rotated is out
//! of scope.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for skusync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub scan: ScanConfig,
    pub sources: SourcesConfig,
    pub conflicts: ConflictsConfig,
    pub logging: LoggingConfig,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("skusync.db"),
        }
    }
}

/// Scan execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Records processed per batch before counters are flushed.
    pub batch_size: usize,
    /// Hard ceiling on one scan job's wall-clock runtime, in seconds.
    pub job_timeout_secs: u64,
    /// Fixed backoff schedule for transient setup failures, in seconds.
    pub retry_backoff_secs: Vec<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            job_timeout_secs: 3600,
            retry_backoff_secs: vec![60, 300, 600],
        }
    }
}

/// Per-source connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// The paginated REST ERP (key/secret auth). `None` when not connected.
    pub erp_a: Option<ErpAConfig>,
    /// The token-based, rate-limited ERP. `None` when not connected.
    pub erp_b: Option<ErpBConfig>,
    /// Connected storefront instances, keyed by their `id`.
    pub storefronts: Vec<StorefrontConfig>,
}

/// ERP-A connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpAConfig {
    /// API base URL.
    pub base_url: String,
    /// API key.
    pub api_key: String,
    /// API secret.
    pub api_secret: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// ERP-B connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpBConfig {
    /// API base URL.
    pub base_url: String,
    /// Bearer token.
    pub token: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Minimum milliseconds between paged requests. The API documents a
    /// 60 requests/minute cap; 1100 ms keeps safely under it.
    #[serde(default = "default_erp_b_interval_ms")]
    pub min_request_interval_ms: u64,
}

/// Storefront instance connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Instance selector, referenced as the session's source id.
    pub id: String,
    /// API base URL.
    pub base_url: String,
    /// Access token.
    pub access_token: String,
    /// Preferred locale for multilingual fields (e.g. "en", "de").
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Conflict resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictsConfig {
    /// Which side wins on a linked record: `external_wins`,
    /// `internal_wins`, or `manual`.
    pub policy: String,
}

impl Default for ConflictsConfig {
    fn default() -> Self {
        Self {
            policy: "manual".to_string(),
        }
    }
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_erp_b_interval_ms() -> u64 {
    1100
}

fn default_locale() -> String {
    "en".to_string()
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Validates cross-field constraints that serde cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scan.batch_size == 0 {
            anyhow::bail!("scan.batch_size must be at least 1");
        }
        if self.scan.job_timeout_secs == 0 {
            anyhow::bail!("scan.job_timeout_secs must be at least 1");
        }
        self.conflicts
            .policy
            .parse::<crate::domain::ConflictPolicy>()
            .map_err(|e| anyhow::anyhow!("conflicts.policy: {e}"))?;

        let mut seen = std::collections::HashSet::new();
        for shop in &self.sources.storefronts {
            if shop.id.trim().is_empty() {
                anyhow::bail!("sources.storefronts entries need a non-empty id");
            }
            if !seen.insert(shop.id.as_str()) {
                anyhow::bail!("duplicate storefront id '{}'", shop.id);
            }
        }
        Ok(())
    }

    /// Returns the parsed conflict policy.
    pub fn conflict_policy(&self) -> crate::domain::ConflictPolicy {
        self.conflicts
            .policy
            .parse()
            .unwrap_or(crate::domain::ConflictPolicy::Manual)
    }

    /// Returns the storefront configuration with the given id, if connected.
    pub fn storefront(&self, id: &str) -> Option<&StorefrontConfig> {
        self.sources.storefronts.iter().find(|s| s.id == id)
    }
}
