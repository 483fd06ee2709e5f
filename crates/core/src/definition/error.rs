//! Error types for definition building.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors building or persisting an ingest definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The scene lacks data the selected strategy needs.
    #[error("invalid scene {scene_id}: {reason}")]
    Validation { scene_id: String, reason: String },

    /// The definition could not be serialized.
    #[error("failed to serialize ingest definition: {0}")]
    Serialization(String),

    /// Persisting the definition failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DefinitionError {
    pub fn validation(scene_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            scene_id: scene_id.into(),
            reason: reason.into(),
        }
    }
}
