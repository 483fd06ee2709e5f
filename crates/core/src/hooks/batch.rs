//! Hooks implemented by batch JAR commands run through `java -cp`.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{HookError, IngestHooks};
use crate::dispatch::BatchConfig;

const MIGRATION_COMMAND: &str = "migration_s3_postgres";
const NOTIFY_COMMAND: &str = "notify_ingest_status";

/// Runs the metadata migration and notification commands of the batch JAR.
pub struct BatchJarHooks {
    batch: BatchConfig,
}

impl BatchJarHooks {
    pub fn new(batch: BatchConfig) -> Self {
        Self { batch }
    }

    /// Full argument list for a batch command.
    pub fn command_args(&self, command: &str, args: &[&str]) -> Vec<String> {
        let mut full = vec![
            "-cp".to_string(),
            self.batch.local_jar.to_string_lossy().into_owned(),
            self.batch.main_class.clone(),
            command.to_string(),
        ];
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }

    async fn run(&self, command: &str, args: &[&str]) -> Result<(), HookError> {
        let full = self.command_args(command, args);
        debug!(
            java = %self.batch.java_path.display(),
            args = ?full,
            "Running batch command"
        );

        let status = Command::new(&self.batch.java_path)
            .args(&full)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| HookError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(HookError::Failed {
                command: command.to_string(),
                exit_code: status.code(),
            })
        }
    }
}

#[async_trait]
impl IngestHooks for BatchJarHooks {
    async fn write_metadata(&self, layer_uri: &str, scene_id: &str) -> Result<(), HookError> {
        self.run(MIGRATION_COMMAND, &[layer_uri, "layer_attributes", scene_id])
            .await?;
        info!(scene_id, "Wrote layer metadata");
        Ok(())
    }

    async fn notify(&self, scene_id: &str) -> Result<(), HookError> {
        self.run(NOTIFY_COMMAND, &[scene_id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_command_args() {
        let hooks = BatchJarHooks::new(BatchConfig::default());
        assert_eq!(
            hooks.command_args(MIGRATION_COMMAND, &["s3://tiles/layers", "layer_attributes", "scene-1"]),
            vec![
                "-cp",
                "/opt/raster-foundry/jars/rf-batch.jar",
                "com.azavea.rf.batch.Main",
                "migration_s3_postgres",
                "s3://tiles/layers",
                "layer_attributes",
                "scene-1",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_java_is_spawn_error() {
        let hooks = BatchJarHooks::new(BatchConfig {
            java_path: PathBuf::from("/nonexistent/java"),
            ..Default::default()
        });
        let result = hooks.notify("scene-1").await;
        assert!(matches!(result, Err(HookError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit() {
        let hooks = BatchJarHooks::new(BatchConfig {
            java_path: PathBuf::from("false"),
            ..Default::default()
        });
        match hooks.write_metadata("s3://tiles/layers", "scene-1").await {
            Err(HookError::Failed { exit_code, .. }) => assert_eq!(exit_code, Some(1)),
            other => panic!("expected failed hook, got {:?}", other),
        }
    }
}
