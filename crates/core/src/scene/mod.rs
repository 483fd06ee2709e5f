//! Scene records and the repository that persists them.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteSceneRepository;
pub use store::{SceneError, SceneRepository};
pub use types::{Band, IngestStatus, Scene, SceneImage};
