//! Error types for the dispatch module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while dispatching or awaiting an ingest job.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The ingest process or cluster step reported failure.
    #[error("Ingest execution failed: {reason}")]
    Execution {
        reason: String,
        exit_code: Option<i32>,
    },

    /// Executable not found.
    #[error("Executable not found at path: {path}")]
    ExecutableNotFound { path: PathBuf },

    /// No cluster is available to take the step.
    #[error("No active cluster found")]
    NoActiveCluster,

    /// The step did not reach a terminal state in time.
    #[error("Step {step_id} did not finish within {waited_secs} seconds")]
    Timeout { step_id: String, waited_secs: u64 },

    /// Cluster API call failed.
    #[error("Cluster API error: {0}")]
    ClusterApi(String),

    /// I/O error launching a process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// Creates an execution failure with the process exit code.
    pub fn execution(reason: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Execution {
            reason: reason.into(),
            exit_code,
        }
    }

    /// Creates a cluster API error.
    pub fn cluster_api(reason: impl Into<String>) -> Self {
        Self::ClusterApi(reason.into())
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ClusterApi(_) | Self::Io(_))
    }
}
