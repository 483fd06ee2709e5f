pub mod config;
pub mod definition;
pub mod dispatch;
pub mod hooks;
pub mod orchestrator;
pub mod retry;
pub mod scene;
pub mod status;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use definition::{DatasourceKind, IngestDefinition, JobDefinitionBuilder};
pub use dispatch::{
    ClusterApi, ClusterDispatcher, DispatchError, DispatchMode, EmrClusterApi, LocalExecutor,
    SparkLocalExecutor,
};
pub use hooks::{BatchJarHooks, IngestHooks};
pub use orchestrator::{
    IngestError, IngestErrorKind, IngestOrchestrator, IngestOutcome, IngestPhase, IngestRequest,
};
pub use retry::{with_retry, RetryPolicy};
pub use scene::{IngestStatus, Scene, SceneRepository, SqliteSceneRepository};
pub use status::{IngestStatusRecord, StatusStore};
pub use storage::{BlobStore, ObjectBlobStore};
