//! Orchestrator settings.

use crate::config::Config;
use crate::retry::RetryPolicy;

/// Settings the orchestrator reads during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Recorded on the scene once the ingest finishes.
    pub ingest_location: String,
    /// Wraps definition upload, stale status cleanup and step submission.
    pub submission: RetryPolicy,
    /// Wraps the final status record read.
    pub status_wait: RetryPolicy,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ingest_location: config.output.ingest_location(),
            submission: config.retry.submission,
            status_wait: config.retry.status_wait,
        }
    }
}
