//! Types for the ingest orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::definition::DefinitionError;
use crate::dispatch::{DispatchError, DispatchMode};
use crate::scene::{IngestStatus, SceneError};
use crate::status::StatusError;

/// Where one ingest run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPhase {
    Queued,
    Submitting,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for IngestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IngestPhase::Queued => "queued",
            IngestPhase::Submitting => "submitting",
            IngestPhase::Running => "running",
            IngestPhase::Completed => "completed",
            IngestPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A request to ingest one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub scene_id: String,
    pub mode: DispatchMode,
    /// Re-ingest regardless of the scene's current status.
    pub ignore_previous: bool,
}

impl IngestRequest {
    pub fn new(scene_id: impl Into<String>, mode: DispatchMode) -> Self {
        Self {
            scene_id: scene_id.into(),
            mode,
            ignore_previous: false,
        }
    }

    pub fn ignore_previous(mut self, ignore: bool) -> Self {
        self.ignore_previous = ignore;
        self
    }
}

/// Result of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub scene_id: String,
    pub definition_id: String,
    pub definition_uri: String,
    pub phase: IngestPhase,
    pub ingest_location: String,
}

/// Coarse classification of [`IngestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestErrorKind {
    /// The scene is not in a state that allows ingesting.
    Precondition,
    /// Input data is missing or malformed.
    Validation,
    /// A remote call failed and may succeed later.
    TransientInfra,
    /// The ingest process or step failed.
    Execution,
    /// The cluster step did not finish in time.
    Timeout,
    NoActiveCluster,
    NotFound,
    Conflict,
    /// The batch ingest ran and reported failure.
    RemoteIngestFailure,
}

/// Errors that can end an ingest run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Scene {scene_id} has ingest status {status}; refusing to re-ingest without override")]
    Precondition {
        scene_id: String,
        status: IngestStatus,
    },

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Status(#[from] StatusError),

    /// The status record belongs to another scene.
    #[error("Status record is for scene {actual}, expected {expected}")]
    StatusMismatch { expected: String, actual: String },

    #[error("Failed to ingest {scene_id} for user {owner}")]
    RemoteIngestFailure { scene_id: String, owner: String },
}

impl IngestError {
    pub fn kind(&self) -> IngestErrorKind {
        match self {
            IngestError::Precondition { .. } => IngestErrorKind::Precondition,
            IngestError::Scene(e) => match e {
                SceneError::NotFound(_) => IngestErrorKind::NotFound,
                SceneError::Conflict { .. } | SceneError::AlreadyExists(_) => {
                    IngestErrorKind::Conflict
                }
                SceneError::Database(_) => IngestErrorKind::TransientInfra,
            },
            IngestError::Definition(e) => match e {
                DefinitionError::Validation { .. } | DefinitionError::Serialization(_) => {
                    IngestErrorKind::Validation
                }
                DefinitionError::Storage(_) => IngestErrorKind::TransientInfra,
            },
            IngestError::Dispatch(e) => match e {
                DispatchError::Execution { .. } | DispatchError::ExecutableNotFound { .. } => {
                    IngestErrorKind::Execution
                }
                DispatchError::NoActiveCluster => IngestErrorKind::NoActiveCluster,
                DispatchError::Timeout { .. } => IngestErrorKind::Timeout,
                DispatchError::ClusterApi(_) | DispatchError::Io(_) => {
                    IngestErrorKind::TransientInfra
                }
            },
            IngestError::Status(e) => match e {
                StatusError::Malformed { .. } => IngestErrorKind::Validation,
                StatusError::Missing { .. } | StatusError::Storage(_) => {
                    IngestErrorKind::TransientInfra
                }
            },
            IngestError::StatusMismatch { .. } => IngestErrorKind::Validation,
            IngestError::RemoteIngestFailure { .. } => IngestErrorKind::RemoteIngestFailure,
        }
    }
}
