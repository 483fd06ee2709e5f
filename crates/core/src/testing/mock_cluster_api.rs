//! Mock cluster API for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::backend_report::BackendReport;
use crate::dispatch::{ClusterApi, ClusterHandle, DispatchError, StepHandle, StepSpec, StepState};
use crate::scene::IngestStatus;
use crate::status::StatusStore;

/// Mock implementation of the ClusterApi trait.
///
/// Provides controllable behavior for testing:
/// - An active cluster (or none)
/// - Transient submit failures
/// - A scripted sequence of step states; the last one repeats
/// - Optionally writes a status record on submit, like the batch job would
#[derive(Clone)]
pub struct MockClusterApi {
    active: Arc<RwLock<Option<ClusterHandle>>>,
    find_calls: Arc<RwLock<u32>>,
    submit_attempts: Arc<RwLock<u32>>,
    submit_failures: Arc<RwLock<u32>>,
    submitted: Arc<RwLock<Vec<StepSpec>>>,
    step_states: Arc<RwLock<VecDeque<StepState>>>,
    state_polls: Arc<RwLock<u32>>,
    report: BackendReport,
}

impl Default for MockClusterApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClusterApi {
    /// Create a mock with one active cluster whose steps complete immediately.
    pub fn new() -> Self {
        Self {
            active: Arc::new(RwLock::new(Some(ClusterHandle("j-MOCKCLUSTER".to_string())))),
            find_calls: Arc::new(RwLock::new(0)),
            submit_attempts: Arc::new(RwLock::new(0)),
            submit_failures: Arc::new(RwLock::new(0)),
            submitted: Arc::new(RwLock::new(Vec::new())),
            step_states: Arc::new(RwLock::new(VecDeque::from([StepState::Completed]))),
            state_polls: Arc::new(RwLock::new(0)),
            report: BackendReport::default(),
        }
    }

    /// Write an `INGESTED` status record for every accepted step.
    pub fn writing_status(mut self, store: StatusStore) -> Self {
        self.report = BackendReport::new(store);
        self
    }

    /// Status the step reports; `None` writes no record.
    pub async fn set_reported_status(&self, status: Option<IngestStatus>) {
        self.report.set_status(status).await;
    }

    /// Scene id written into the record instead of the submitted one.
    pub async fn set_reported_scene(&self, scene_id: Option<String>) {
        self.report.set_scene_id(scene_id).await;
    }

    pub async fn set_active_cluster(&self, cluster: Option<ClusterHandle>) {
        *self.active.write().await = cluster;
    }

    /// Make the next `count` submits fail with a transient API error.
    pub async fn fail_next_submits(&self, count: u32) {
        *self.submit_failures.write().await = count;
    }

    /// States returned by successive polls. The last state repeats.
    pub async fn set_step_states(&self, states: Vec<StepState>) {
        *self.step_states.write().await = states.into();
    }

    /// Steps the cluster accepted.
    pub async fn submitted_steps(&self) -> Vec<StepSpec> {
        self.submitted.read().await.clone()
    }

    pub async fn submit_attempts(&self) -> u32 {
        *self.submit_attempts.read().await
    }

    pub async fn state_polls(&self) -> u32 {
        *self.state_polls.read().await
    }

    pub async fn find_calls(&self) -> u32 {
        *self.find_calls.read().await
    }

    /// Total calls of any kind.
    pub async fn call_count(&self) -> u32 {
        self.find_calls().await + self.submit_attempts().await + self.state_polls().await
    }

    fn arg_after<'a>(step: &'a StepSpec, flag: &str) -> Option<&'a str> {
        step.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| step.args.get(i + 1))
            .map(String::as_str)
    }
}

#[async_trait]
impl ClusterApi for MockClusterApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn find_active_cluster(&self) -> Result<Option<ClusterHandle>, DispatchError> {
        *self.find_calls.write().await += 1;
        Ok(self.active.read().await.clone())
    }

    async fn submit_step(
        &self,
        _cluster: &ClusterHandle,
        step: &StepSpec,
    ) -> Result<StepHandle, DispatchError> {
        let attempt = {
            let mut attempts = self.submit_attempts.write().await;
            *attempts += 1;
            *attempts
        };

        {
            let mut failures = self.submit_failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(DispatchError::cluster_api("ThrottlingException: rate exceeded"));
            }
        }

        self.submitted.write().await.push(step.clone());

        let definition_id = step.name.strip_prefix("ingest-").unwrap_or(&step.name);
        let scene_id = Self::arg_after(step, "-s").unwrap_or_default();
        self.report.write(definition_id, scene_id).await;

        Ok(StepHandle(format!("s-MOCK{:04}", attempt)))
    }

    async fn step_state(
        &self,
        _cluster: &ClusterHandle,
        _step: &StepHandle,
    ) -> Result<StepState, DispatchError> {
        *self.state_polls.write().await += 1;

        let mut states = self.step_states.write().await;
        let state = if states.len() > 1 {
            states.pop_front()
        } else {
            states.front().copied()
        };
        Ok(state.unwrap_or(StepState::Completed))
    }
}
