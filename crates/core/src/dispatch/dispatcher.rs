//! Submits ingest jobs and waits for cluster steps.

use std::sync::Arc;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::retry::{with_retry, RetryPolicy};

use super::cluster::{ingest_step, ClusterApi};
use super::config::{BatchConfig, ClusterConfig};
use super::error::DispatchError;
use super::local::LocalExecutor;
use super::types::{ClusterHandle, DispatchMode, IngestJob, StepHandle, StepState, Submission};

/// Routes an ingest job to the local executor or the managed cluster.
pub struct ClusterDispatcher {
    local: Arc<dyn LocalExecutor>,
    cluster: Arc<dyn ClusterApi>,
    batch: BatchConfig,
    cluster_config: ClusterConfig,
    submission: RetryPolicy,
}

impl ClusterDispatcher {
    pub fn new(
        local: Arc<dyn LocalExecutor>,
        cluster: Arc<dyn ClusterApi>,
        batch: BatchConfig,
        cluster_config: ClusterConfig,
        submission: RetryPolicy,
    ) -> Self {
        Self {
            local,
            cluster,
            batch,
            cluster_config,
            submission,
        }
    }

    /// Submit `job` to the backend selected by `mode`.
    ///
    /// Local mode blocks until the process exits. Managed mode returns as soon
    /// as the step is accepted; use [`await_completion`](Self::await_completion)
    /// to wait for it.
    pub async fn submit(
        &self,
        job: &IngestJob,
        mode: DispatchMode,
    ) -> Result<Submission, DispatchError> {
        match mode {
            DispatchMode::Local => {
                info!(
                    scene_id = %job.scene_id,
                    definition_id = %job.definition_id,
                    executor = self.local.name(),
                    "Running ingest locally"
                );
                self.local.run(job).await?;
                Ok(Submission::Finished)
            }
            DispatchMode::Managed => {
                let cluster = self
                    .cluster
                    .find_active_cluster()
                    .await?
                    .ok_or(DispatchError::NoActiveCluster)?;

                let spec = ingest_step(job, &self.batch, &self.cluster_config);
                debug!(cluster = %cluster, step = ?spec, "Submitting cluster step");

                let step = with_retry(&self.submission, "submit_step", || {
                    self.cluster.submit_step(&cluster, &spec)
                })
                .await?;

                info!(
                    scene_id = %job.scene_id,
                    cluster = %cluster,
                    step = %step,
                    backend = self.cluster.name(),
                    "Submitted ingest step"
                );
                Ok(Submission::Step { cluster, step })
            }
        }
    }

    /// Poll a step until it reaches a terminal state.
    ///
    /// Returns `true` when the step completed, `false` when it failed or was
    /// cancelled. Transient API errors are logged and polling continues.
    pub async fn await_completion(
        &self,
        step: &StepHandle,
        cluster: &ClusterHandle,
    ) -> Result<bool, DispatchError> {
        let max_wait = self.cluster_config.max_wait();
        let poll_max = self.cluster_config.poll_max();
        let mut delay = self.cluster_config.poll_initial();
        let started = Instant::now();

        loop {
            match self.cluster.step_state(cluster, step).await {
                Ok(state) if state.is_terminal() => {
                    info!(step = %step, state = %state, "Cluster step finished");
                    return Ok(state == StepState::Completed);
                }
                Ok(state) => debug!(step = %step, state = %state, "Cluster step in progress"),
                Err(e) if e.is_retryable() => {
                    warn!(step = %step, error = %e, "Failed to read step state")
                }
                Err(e) => return Err(e),
            }

            let elapsed = started.elapsed();
            if elapsed >= max_wait {
                return Err(DispatchError::Timeout {
                    step_id: step.0.clone(),
                    waited_secs: elapsed.as_secs(),
                });
            }

            sleep(delay.min(max_wait - elapsed)).await;
            delay = (delay * 2).min(poll_max);
        }
    }
}
