//! Ingest orchestrator implementation.
//!
//! Drives one scene through `Queued -> Submitting -> Running -> Completed | Failed`.
//! Every step runs sequentially; the only waits are the retry backoffs and the
//! bounded cluster step poll.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::definition::{IngestDefinition, JobDefinitionBuilder};
use crate::dispatch::{
    ClusterApi, ClusterDispatcher, DispatchError, IngestJob, LocalExecutor, Submission,
};
use crate::hooks::IngestHooks;
use crate::retry::with_retry;
use crate::scene::{IngestStatus, Scene, SceneRepository};
use crate::status::{IngestStatusRecord, StatusError, StatusStore};
use crate::storage::BlobStore;

use super::config::OrchestratorConfig;
use super::types::{IngestError, IngestOutcome, IngestPhase, IngestRequest};

/// The ingest orchestrator: one scene per [`run`](IngestOrchestrator::run).
pub struct IngestOrchestrator {
    config: OrchestratorConfig,
    scenes: Arc<dyn SceneRepository>,
    definitions: JobDefinitionBuilder,
    statuses: StatusStore,
    dispatcher: ClusterDispatcher,
    hooks: Arc<dyn IngestHooks>,
}

impl IngestOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        scenes: Arc<dyn SceneRepository>,
        definitions: JobDefinitionBuilder,
        statuses: StatusStore,
        dispatcher: ClusterDispatcher,
        hooks: Arc<dyn IngestHooks>,
    ) -> Self {
        Self {
            config,
            scenes,
            definitions,
            statuses,
            dispatcher,
            hooks,
        }
    }

    /// Wire an orchestrator from application config and its collaborators.
    pub fn from_config(
        config: &Config,
        scenes: Arc<dyn SceneRepository>,
        blobs: Arc<dyn BlobStore>,
        local: Arc<dyn LocalExecutor>,
        cluster: Arc<dyn ClusterApi>,
        hooks: Arc<dyn IngestHooks>,
    ) -> Self {
        let settings = OrchestratorConfig::from_config(config);
        let definitions = JobDefinitionBuilder::new(
            blobs.clone(),
            config.storage.clone(),
            config.datasources.clone(),
            settings.ingest_location.clone(),
        );
        let statuses = StatusStore::new(blobs, config.storage.clone());
        let dispatcher = ClusterDispatcher::new(
            local,
            cluster,
            config.batch.clone(),
            config.cluster.clone(),
            settings.submission,
        );

        Self::new(settings, scenes, definitions, statuses, dispatcher, hooks)
    }

    /// Ingest one scene.
    ///
    /// On success returns the outcome with phase `Completed`. A batch job that
    /// reports failure still has its status recorded and the notifier run
    /// before [`IngestError::RemoteIngestFailure`] is returned. Any other
    /// failure after the scene was marked `INGESTING` marks it `FAILED` first.
    pub async fn run(&self, request: &IngestRequest) -> Result<IngestOutcome, IngestError> {
        let scene = self.scenes.get(&request.scene_id)?;
        self.log_phase(&scene, IngestPhase::Queued);

        if !request.ignore_previous && !scene.ingest_status.is_ingestible() {
            return Err(IngestError::Precondition {
                scene_id: scene.id,
                status: scene.ingest_status,
            });
        }
        if request.ignore_previous && !scene.ingest_status.is_ingestible() {
            warn!(
                scene_id = %scene.id,
                status = %scene.ingest_status,
                "Ignoring previous ingest status"
            );
        }

        // A concurrent run that read the same version loses here with Conflict.
        let scene = self.claim(scene)?;
        self.log_phase(&scene, IngestPhase::Submitting);

        let definition = match self.prepare_definition(&scene).await {
            Ok(definition) => definition,
            Err(e) => return Err(self.fail(scene, e).await),
        };
        let definition_uri = definition.uri.clone().unwrap_or_default();
        let job = IngestJob::new(&scene.id, &definition.id, &definition_uri);

        let step_succeeded = match self.dispatch(&scene, &job, request).await {
            Ok(succeeded) => succeeded,
            Err(e) => return Err(self.fail(scene, e.into()).await),
        };

        let record = match self.wait_for_status(&definition.id, step_succeeded).await {
            Ok(record) => record,
            Err(e) => return Err(self.fail(scene, e).await),
        };
        if record.scene_id != scene.id {
            let mismatch = IngestError::StatusMismatch {
                expected: scene.id.clone(),
                actual: record.scene_id,
            };
            return Err(self.fail(scene, mismatch).await);
        }

        let phase = match record.ingest_status {
            IngestStatus::Ingested => IngestPhase::Completed,
            other => {
                if other != IngestStatus::Failed {
                    warn!(
                        scene_id = %scene.id,
                        status = %other,
                        "Status record is not terminal, treating as failed"
                    );
                }
                IngestPhase::Failed
            }
        };

        self.finish(scene, definition, definition_uri, phase).await
    }

    /// Build and upload a fresh definition, then clear any status record under its id.
    async fn prepare_definition(&self, scene: &Scene) -> Result<IngestDefinition, IngestError> {
        let built = self.definitions.build(scene)?;

        let definition = with_retry(&self.config.submission, "persist_definition", || {
            self.definitions.persist(&built)
        })
        .await?;

        with_retry(&self.config.submission, "clear_stale_status", || {
            self.statuses.delete(&definition.id)
        })
        .await?;

        Ok(definition)
    }

    /// Submit the job and wait for the backend. Returns whether the backend
    /// reported success.
    async fn dispatch(
        &self,
        scene: &Scene,
        job: &IngestJob,
        request: &IngestRequest,
    ) -> Result<bool, DispatchError> {
        match self.dispatcher.submit(job, request.mode).await? {
            Submission::Finished => Ok(true),
            Submission::Step { cluster, step } => {
                self.log_phase(scene, IngestPhase::Running);
                self.dispatcher.await_completion(&step, &cluster).await
            }
        }
    }

    async fn wait_for_status(
        &self,
        definition_id: &str,
        step_succeeded: bool,
    ) -> Result<IngestStatusRecord, IngestError> {
        let result = with_retry(&self.config.status_wait, "read_status", || {
            self.statuses.require(definition_id)
        })
        .await;

        match result {
            Ok(record) => Ok(record),
            Err(StatusError::Missing { .. }) if !step_succeeded => Err(DispatchError::execution(
                format!("cluster step for ingest definition {} failed", definition_id),
                None,
            )
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Record the terminal status, run the hooks and report the result.
    async fn finish(
        &self,
        scene: Scene,
        definition: IngestDefinition,
        definition_uri: String,
        phase: IngestPhase,
    ) -> Result<IngestOutcome, IngestError> {
        let location = self.config.ingest_location.clone();

        if phase == IngestPhase::Completed {
            if let Err(e) = self.hooks.write_metadata(&location, &scene.id).await {
                warn!(scene_id = %scene.id, error = %e, "Failed to write layer metadata");
            }
        }

        let status = match phase {
            IngestPhase::Completed => IngestStatus::Ingested,
            _ => IngestStatus::Failed,
        };
        let stored = self.record_status(&scene.id, status, Some(&location));
        self.notify(&scene.id).await;
        let scene = stored?;
        self.log_phase(&scene, phase);

        if phase == IngestPhase::Failed {
            return Err(IngestError::RemoteIngestFailure {
                scene_id: scene.id,
                owner: scene.owner,
            });
        }

        Ok(IngestOutcome {
            scene_id: scene.id,
            definition_id: definition.id,
            definition_uri,
            phase,
            ingest_location: location,
        })
    }

    /// Mark the scene failed after an error this run observed, then hand the error back.
    async fn fail(&self, scene: Scene, error: IngestError) -> IngestError {
        warn!(scene_id = %scene.id, error = %error, "Ingest failed, marking scene FAILED");

        match self.record_status(&scene.id, IngestStatus::Failed, None) {
            Ok(scene) => self.log_phase(&scene, IngestPhase::Failed),
            Err(e) => warn!(scene_id = %scene.id, error = %e, "Failed to mark scene FAILED"),
        }
        self.notify(&scene.id).await;

        error
    }

    /// Move the scene to `INGESTING`, conditional on the version read at entry.
    fn claim(&self, scene: Scene) -> Result<Scene, IngestError> {
        let stored = self.scenes.update(&scene.with_status(IngestStatus::Ingesting))?;
        debug!(scene_id = %stored.id, version = stored.version, "Claimed scene");
        Ok(stored)
    }

    /// Write a status this run owns. Other edits made while the job ran are kept.
    fn record_status(
        &self,
        scene_id: &str,
        status: IngestStatus,
        location: Option<&str>,
    ) -> Result<Scene, IngestError> {
        let stored = self.scenes.set_ingest_status(scene_id, status, location)?;
        debug!(scene_id = %stored.id, status = %stored.ingest_status, version = stored.version, "Updated scene");
        Ok(stored)
    }

    async fn notify(&self, scene_id: &str) {
        if let Err(e) = self.hooks.notify(scene_id).await {
            warn!(scene_id, error = %e, "Failed to notify ingest status");
        }
    }

    fn log_phase(&self, scene: &Scene, phase: IngestPhase) {
        info!(
            scene_id = %scene.id,
            status = %scene.ingest_status,
            phase = %phase,
            "Ingest phase"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchMode;
    use crate::orchestrator::IngestErrorKind;
    use crate::scene::SqliteSceneRepository;
    use crate::testing::{fixtures, MockBlobStore, MockClusterApi, MockIngestHooks, MockLocalExecutor};

    struct Harness {
        scenes: Arc<SqliteSceneRepository>,
        blobs: Arc<MockBlobStore>,
        local: Arc<MockLocalExecutor>,
        cluster: Arc<MockClusterApi>,
        hooks: Arc<MockIngestHooks>,
        orchestrator: IngestOrchestrator,
    }

    fn harness() -> Harness {
        let config = fixtures::config();
        let scenes = Arc::new(SqliteSceneRepository::in_memory().unwrap());
        let blobs = Arc::new(MockBlobStore::new());
        let statuses = StatusStore::new(blobs.clone(), config.storage.clone());
        let local = Arc::new(MockLocalExecutor::new().writing_status(statuses.clone()));
        let cluster = Arc::new(MockClusterApi::new().writing_status(statuses));
        let hooks = Arc::new(MockIngestHooks::new());

        let orchestrator = IngestOrchestrator::from_config(
            &config,
            scenes.clone(),
            blobs.clone(),
            local.clone(),
            cluster.clone(),
            hooks.clone(),
        );

        Harness {
            scenes,
            blobs,
            local,
            cluster,
            hooks,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_local_ingest_completes() {
        let h = harness();
        h.scenes.insert(&fixtures::generic_scene("scene-1")).unwrap();

        let outcome = h
            .orchestrator
            .run(&IngestRequest::new("scene-1", DispatchMode::Local))
            .await
            .unwrap();

        assert_eq!(outcome.phase, IngestPhase::Completed);
        assert_eq!(outcome.ingest_location, "s3://test-tiles/layers");

        let scene = h.scenes.get("scene-1").unwrap();
        assert_eq!(scene.ingest_status, IngestStatus::Ingested);
        assert_eq!(scene.ingest_location.as_deref(), Some("s3://test-tiles/layers"));

        assert_eq!(h.local.runs().await.len(), 1);
        assert_eq!(h.cluster.call_count().await, 0);
        assert_eq!(h.hooks.metadata_calls().await.len(), 1);
        assert_eq!(h.hooks.notifications().await, vec!["scene-1".to_string()]);
    }

    #[tokio::test]
    async fn test_precondition_rejects_without_writes() {
        let h = harness();
        let scene = fixtures::generic_scene("scene-1").with_status(IngestStatus::Ingested);
        h.scenes.insert(&scene).unwrap();

        let err = h
            .orchestrator
            .run(&IngestRequest::new("scene-1", DispatchMode::Local))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), IngestErrorKind::Precondition);
        assert!(h.blobs.writes().await.is_empty());
        assert_eq!(h.scenes.get("scene-1").unwrap().version, 0);
        assert!(h.local.runs().await.is_empty());
        assert!(h.hooks.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_ignore_previous_overrides_guard() {
        let h = harness();
        let scene = fixtures::generic_scene("scene-1").with_status(IngestStatus::Ingested);
        h.scenes.insert(&scene).unwrap();

        let request = IngestRequest::new("scene-1", DispatchMode::Local).ignore_previous(true);
        let outcome = h.orchestrator.run(&request).await.unwrap();

        assert_eq!(outcome.phase, IngestPhase::Completed);
    }

    #[tokio::test]
    async fn test_missing_scene_is_not_found() {
        let h = harness();
        let err = h
            .orchestrator
            .run(&IngestRequest::new("missing", DispatchMode::Local))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), IngestErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_validation_failure_marks_scene_failed() {
        let h = harness();
        // Generic scene without images cannot produce a definition.
        let scene = Scene::new("scene-1", "user-1", "some-other-datasource");
        h.scenes.insert(&scene).unwrap();

        let err = h
            .orchestrator
            .run(&IngestRequest::new("scene-1", DispatchMode::Local))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), IngestErrorKind::Validation);
        assert_eq!(
            h.scenes.get("scene-1").unwrap().ingest_status,
            IngestStatus::Failed
        );
        assert!(h.local.runs().await.is_empty());
        assert_eq!(h.hooks.notifications().await, vec!["scene-1".to_string()]);
    }
}
