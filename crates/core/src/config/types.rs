use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::definition::DatasourceConfig;
use crate::dispatch::{BatchConfig, ClusterConfig, LocalConfig};
use crate::retry::RetryPolicy;
use crate::storage::StorageConfig;

/// Root configuration, read once at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub datasources: DatasourceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Where ingested layers are written.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Bucket the tile server reads layers from (TILE_SERVER_BUCKET).
    #[serde(default)]
    pub tile_server_bucket: String,
    /// Key prefix for layers within the bucket.
    #[serde(default = "default_layers_prefix")]
    pub layers_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            tile_server_bucket: String::new(),
            layers_prefix: default_layers_prefix(),
        }
    }
}

impl OutputConfig {
    /// URI recorded as a scene's ingest location.
    pub fn ingest_location(&self) -> String {
        format!(
            "s3://{}/{}",
            self.tile_server_bucket,
            self.layers_prefix.trim_matches('/')
        )
    }
}

fn default_layers_prefix() -> String {
    "layers".to_string()
}

/// Scene database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("rf-scenes.db")
}

/// The two retry policies used by the orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_submission_policy")]
    pub submission: RetryPolicy,
    #[serde(default = "default_status_wait_policy")]
    pub status_wait: RetryPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            submission: default_submission_policy(),
            status_wait: default_status_wait_policy(),
        }
    }
}

fn default_submission_policy() -> RetryPolicy {
    RetryPolicy::SUBMISSION
}

fn default_status_wait_policy() -> RetryPolicy {
    RetryPolicy::STATUS_WAIT
}

/// External error tracking (Rollbar).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportingConfig {
    /// Server-side access token. Reporting is disabled when absent.
    #[serde(default)]
    pub rollbar_token: Option<String>,
    /// Environment name attached to every report.
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_rollbar_endpoint")]
    pub endpoint: String,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            rollbar_token: None,
            environment: default_environment(),
            endpoint: default_rollbar_endpoint(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_rollbar_endpoint() -> String {
    "https://api.rollbar.com/api/1/item/".to_string()
}

/// Config with secrets redacted, safe to log.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub storage: StorageConfig,
    pub batch: BatchConfig,
    pub local: LocalConfig,
    pub cluster: ClusterConfig,
    pub output: OutputConfig,
    pub datasources: DatasourceConfig,
    pub database: DatabaseConfig,
    pub retry: RetryConfig,
    pub reporting: SanitizedReportingConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedReportingConfig {
    pub rollbar_token_configured: bool,
    pub environment: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            storage: config.storage.clone(),
            batch: config.batch.clone(),
            local: config.local.clone(),
            cluster: config.cluster.clone(),
            output: config.output.clone(),
            datasources: config.datasources.clone(),
            database: config.database.clone(),
            retry: config.retry.clone(),
            reporting: SanitizedReportingConfig {
                rollbar_token_configured: config
                    .reporting
                    .rollbar_token
                    .as_deref()
                    .is_some_and(|t| !t.is_empty()),
                environment: config.reporting.environment.clone(),
            },
        }
    }
}
