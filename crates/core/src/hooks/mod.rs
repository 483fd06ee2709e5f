//! Post-ingest batch commands.
//!
//! After the scene status is settled two commands from the batch JAR run:
//! metadata migration (successful ingests only) and ingest status
//! notification (always).

mod batch;
mod error;

pub use batch::BatchJarHooks;
pub use error::HookError;

use async_trait::async_trait;

/// Collaborators invoked once an ingest reaches a terminal state.
#[async_trait]
pub trait IngestHooks: Send + Sync {
    /// Copy layer attributes at `layer_uri` into the platform database.
    async fn write_metadata(&self, layer_uri: &str, scene_id: &str) -> Result<(), HookError>;

    /// Tell the scene's users that its ingest status changed.
    async fn notify(&self, scene_id: &str) -> Result<(), HookError>;
}
