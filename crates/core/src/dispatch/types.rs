//! Types for dispatching ingest jobs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where an ingest runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Spark local mode in a child process.
    Local,
    /// A step on a managed cluster.
    Managed,
}

/// The job handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestJob {
    pub scene_id: String,
    pub definition_id: String,
    pub definition_uri: String,
}

impl IngestJob {
    pub fn new(
        scene_id: impl Into<String>,
        definition_id: impl Into<String>,
        definition_uri: impl Into<String>,
    ) -> Self {
        Self {
            scene_id: scene_id.into(),
            definition_id: definition_id.into(),
            definition_uri: definition_uri.into(),
        }
    }

    /// Arguments the ingest main class expects.
    pub fn ingest_args(&self) -> Vec<String> {
        vec![
            "-t".to_string(),
            "--overwrite".to_string(),
            "-s".to_string(),
            self.scene_id.clone(),
            "-j".to_string(),
            self.definition_uri.clone(),
        ]
    }

    /// Name of the cluster step for this job.
    pub fn step_name(&self) -> String {
        format!("ingest-{}", self.definition_id)
    }
}

/// Identifies a managed cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterHandle(pub String);

/// Identifies a step submitted to a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepHandle(pub String);

impl fmt::Display for ClusterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StepHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of work for a managed cluster.
///
/// A failed step never takes the cluster down: later steps keep running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpec {
    pub name: String,
    pub jar: String,
    pub args: Vec<String>,
}

/// Lifecycle state of a cluster step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl StepState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Completed | StepState::Failed | StepState::Cancelled
        )
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepState::Pending => "PENDING",
            StepState::Running => "RUNNING",
            StepState::Completed => "COMPLETED",
            StepState::Failed => "FAILED",
            StepState::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Result of submitting a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The backend ran to completion with a zero exit (local mode).
    Finished,
    /// A cluster step was submitted and must be awaited.
    Step {
        cluster: ClusterHandle,
        step: StepHandle,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_args() {
        let job = IngestJob::new("s1", "d1", "s3://b/d1.json");
        assert_eq!(
            job.ingest_args(),
            vec!["-t", "--overwrite", "-s", "s1", "-j", "s3://b/d1.json"]
        );
        assert_eq!(job.step_name(), "ingest-d1");
    }

    #[test]
    fn test_terminal_states() {
        assert!(StepState::Completed.is_terminal());
        assert!(StepState::Failed.is_terminal());
        assert!(StepState::Cancelled.is_terminal());
        assert!(!StepState::Pending.is_terminal());
        assert!(!StepState::Running.is_terminal());
    }
}
