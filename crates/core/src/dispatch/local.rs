//! Local-mode Spark execution.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::config::{BatchConfig, LocalConfig};
use super::error::DispatchError;
use super::types::IngestJob;

/// Runs an ingest job to completion on this machine.
#[async_trait]
pub trait LocalExecutor: Send + Sync {
    /// Returns the name of this executor.
    fn name(&self) -> &str;

    /// Run the job and wait for it to exit.
    ///
    /// A non-zero exit is an [`DispatchError::Execution`] carrying the exit code,
    /// or no code when the process was killed by a signal.
    async fn run(&self, job: &IngestJob) -> Result<(), DispatchError>;
}

/// `spark-submit` in local mode.
pub struct SparkLocalExecutor {
    local: LocalConfig,
    batch: BatchConfig,
}

impl SparkLocalExecutor {
    pub fn new(local: LocalConfig, batch: BatchConfig) -> Self {
        Self { local, batch }
    }

    /// Command line arguments passed to spark-submit.
    pub fn build_args(&self, job: &IngestJob) -> Vec<String> {
        let mut args = vec![
            "--master".to_string(),
            format!("local[{}]", self.local.cores),
            "--driver-memory".to_string(),
            format!("{}g", self.local.memory_gb),
            "--class".to_string(),
            self.batch.ingest_class.clone(),
            self.batch.local_jar.to_string_lossy().into_owned(),
        ];
        args.extend(job.ingest_args());
        args
    }
}

#[async_trait]
impl LocalExecutor for SparkLocalExecutor {
    fn name(&self) -> &str {
        "spark-local"
    }

    async fn run(&self, job: &IngestJob) -> Result<(), DispatchError> {
        let args = self.build_args(job);
        debug!(
            program = %self.local.spark_submit.display(),
            args = ?args,
            "Launching local ingest"
        );

        // Spark output goes straight to our stdout/stderr.
        let status = Command::new(&self.local.spark_submit)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DispatchError::ExecutableNotFound {
                        path: self.local.spark_submit.clone(),
                    }
                } else {
                    DispatchError::Io(e)
                }
            })?;

        if status.success() {
            info!(scene_id = %job.scene_id, "Local ingest finished");
            Ok(())
        } else {
            Err(DispatchError::execution(
                format!("local ingest for scene {} exited with {}", job.scene_id, status),
                status.code(),
            ))
        }
    }
}
