//! AWS EMR cluster backend.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_emr::types::{
    ActionOnFailure, ClusterState, HadoopJarStepConfig, StepConfig, StepState as EmrStepState,
};
use tracing::{debug, info, warn};

use super::cluster::ClusterApi;
use super::config::ClusterConfig;
use super::error::DispatchError;
use super::types::{ClusterHandle, StepHandle, StepSpec, StepState};

/// Submits ingest steps to a running EMR cluster.
pub struct EmrClusterApi {
    config: ClusterConfig,
    client: aws_sdk_emr::Client,
}

impl EmrClusterApi {
    /// Create a client for the configured region using the default AWS credential chain.
    pub async fn new(config: ClusterConfig) -> Self {
        let region = aws_sdk_emr::config::Region::new(config.region.clone());
        let aws_cfg = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        info!(region = %config.region, cluster_name = ?config.name, "EMR client initialised");

        Self {
            client: aws_sdk_emr::Client::new(&aws_cfg),
            config,
        }
    }

    fn is_wanted(&self, cluster_name: Option<&str>) -> bool {
        match &self.config.name {
            Some(name) => cluster_name == Some(name.as_str()),
            None => true,
        }
    }

    fn step_state(state: &EmrStepState) -> StepState {
        match state {
            EmrStepState::Pending | EmrStepState::CancelPending => StepState::Pending,
            EmrStepState::Running => StepState::Running,
            EmrStepState::Completed => StepState::Completed,
            EmrStepState::Failed => StepState::Failed,
            EmrStepState::Cancelled | EmrStepState::Interrupted => StepState::Cancelled,
            other => {
                warn!(state = ?other, "Unrecognised EMR step state");
                StepState::Running
            }
        }
    }
}

#[async_trait]
impl ClusterApi for EmrClusterApi {
    fn name(&self) -> &str {
        "emr"
    }

    async fn find_active_cluster(&self) -> Result<Option<ClusterHandle>, DispatchError> {
        let mut marker: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let resp = self
                .client
                .list_clusters()
                .cluster_states(ClusterState::Waiting)
                .cluster_states(ClusterState::Running)
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| DispatchError::cluster_api(e.to_string()))?;
            pages += 1;

            let cluster = resp
                .clusters()
                .iter()
                .filter(|c| self.is_wanted(c.name()))
                .find_map(|c| c.id().map(|id| ClusterHandle(id.to_string())));

            if cluster.is_some() {
                debug!(cluster = ?cluster, pages, "Active cluster lookup");
                return Ok(cluster);
            }

            match resp.marker() {
                Some(next) => marker = Some(next.to_string()),
                None => break,
            }
        }

        debug!(pages, "No active cluster found");
        Ok(None)
    }

    async fn submit_step(
        &self,
        cluster: &ClusterHandle,
        step: &StepSpec,
    ) -> Result<StepHandle, DispatchError> {
        let jar_step = HadoopJarStepConfig::builder()
            .jar(&step.jar)
            .set_args(Some(step.args.clone()))
            .build();

        let step_config = StepConfig::builder()
            .name(&step.name)
            .action_on_failure(ActionOnFailure::Continue)
            .hadoop_jar_step(jar_step)
            .build();

        let resp = self
            .client
            .add_job_flow_steps()
            .job_flow_id(&cluster.0)
            .steps(step_config)
            .send()
            .await
            .map_err(|e| DispatchError::cluster_api(e.to_string()))?;

        let step_id = resp
            .step_ids()
            .first()
            .ok_or_else(|| DispatchError::cluster_api("No step ID returned"))?;

        Ok(StepHandle(step_id.clone()))
    }

    async fn step_state(
        &self,
        cluster: &ClusterHandle,
        step: &StepHandle,
    ) -> Result<StepState, DispatchError> {
        let resp = self
            .client
            .describe_step()
            .cluster_id(&cluster.0)
            .step_id(&step.0)
            .send()
            .await
            .map_err(|e| DispatchError::cluster_api(e.to_string()))?;

        let state = resp
            .step()
            .and_then(|s| s.status())
            .and_then(|s| s.state())
            .ok_or_else(|| DispatchError::cluster_api("No step status in response"))?;

        Ok(Self::step_state(state))
    }
}
