//! Scene repository trait and error type.

use thiserror::Error;

use super::{IngestStatus, Scene};

/// Error type for scene repository operations.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Scene not found.
    #[error("Scene not found: {0}")]
    NotFound(String),

    /// The scene was modified since it was read.
    #[error("Scene {scene_id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        scene_id: String,
        expected: u64,
        actual: u64,
    },

    /// A scene with this id already exists.
    #[error("Scene already exists: {0}")]
    AlreadyExists(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Trait for scene storage backends.
///
/// Updates are optimistic: [`SceneRepository::update`] only succeeds when the
/// stored version still equals `scene.version`. Terminal status writes go
/// through [`SceneRepository::set_ingest_status`], which touches only the
/// ingest fields and never conflicts.
pub trait SceneRepository: Send + Sync {
    /// Get a scene by ID.
    fn get(&self, id: &str) -> Result<Scene, SceneError>;

    /// Insert a new scene.
    fn insert(&self, scene: &Scene) -> Result<Scene, SceneError>;

    /// Persist `scene` if nobody else has updated it since it was read.
    ///
    /// Returns the stored scene with its bumped version.
    fn update(&self, scene: &Scene) -> Result<Scene, SceneError>;

    /// Set the ingest status (and the location, when given) on the current
    /// stored scene, whatever its version.
    ///
    /// Returns the stored scene with its bumped version.
    fn set_ingest_status(
        &self,
        id: &str,
        status: IngestStatus,
        location: Option<&str>,
    ) -> Result<Scene, SceneError>;
}
