//! Managed cluster abstraction.

use async_trait::async_trait;

use super::config::{BatchConfig, ClusterConfig};
use super::error::DispatchError;
use super::types::{ClusterHandle, IngestJob, StepHandle, StepSpec, StepState};

/// Operations the dispatcher needs from a managed cluster service.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Returns the name of this backend.
    fn name(&self) -> &str;

    /// Find a cluster that can accept steps, if any.
    async fn find_active_cluster(&self) -> Result<Option<ClusterHandle>, DispatchError>;

    /// Submit one step to the cluster.
    async fn submit_step(
        &self,
        cluster: &ClusterHandle,
        step: &StepSpec,
    ) -> Result<StepHandle, DispatchError>;

    /// Current state of a submitted step.
    async fn step_state(
        &self,
        cluster: &ClusterHandle,
        step: &StepHandle,
    ) -> Result<StepState, DispatchError>;
}

/// Build the cluster step that runs `job` through the script runner.
pub fn ingest_step(job: &IngestJob, batch: &BatchConfig, cluster: &ClusterConfig) -> StepSpec {
    let mut args = vec![
        cluster.spark_submit.clone(),
        "--master".to_string(),
        "yarn".to_string(),
        "--deploy-mode".to_string(),
        "cluster".to_string(),
        "--conf".to_string(),
        "spark.yarn.submit.waitAppCompletion=false".to_string(),
        "--class".to_string(),
        batch.ingest_class.clone(),
        batch.cluster_jar_uri(),
    ];
    args.extend(job.ingest_args());

    StepSpec {
        name: job.step_name(),
        jar: cluster.script_runner_jar.clone(),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_step() {
        let job = IngestJob::new("scene-1", "def-1", "s3://bucket/ingest-definitions/def-1.json");
        let batch = BatchConfig {
            jar_path: "rf-batch-abc.jar".to_string(),
            artifacts_uri: "s3://artifacts/batch".to_string(),
            ..Default::default()
        };
        let step = ingest_step(&job, &batch, &ClusterConfig::default());

        assert_eq!(step.name, "ingest-def-1");
        assert!(step.jar.ends_with("script-runner.jar"));
        assert_eq!(
            step.args,
            vec![
                "/usr/bin/spark-submit",
                "--master",
                "yarn",
                "--deploy-mode",
                "cluster",
                "--conf",
                "spark.yarn.submit.waitAppCompletion=false",
                "--class",
                "com.azavea.rf.batch.ingest.spark.Ingest",
                "s3://artifacts/batch/rf-batch-abc.jar",
                "-t",
                "--overwrite",
                "-s",
                "scene-1",
                "-j",
                "s3://bucket/ingest-definitions/def-1.json",
            ]
        );
    }
}
