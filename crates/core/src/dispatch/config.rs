//! Configuration for the dispatch backends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Batch JAR location and entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// JAR file name under `artifacts_uri` used by cluster steps (BATCH_JAR_PATH).
    #[serde(default = "default_jar_path")]
    pub jar_path: String,

    /// S3 prefix holding published batch JARs.
    #[serde(default = "default_artifacts_uri")]
    pub artifacts_uri: String,

    /// Batch JAR on the local filesystem, for local ingests and hooks.
    #[serde(default = "default_local_jar")]
    pub local_jar: PathBuf,

    /// Spark ingest entry point.
    #[serde(default = "default_ingest_class")]
    pub ingest_class: String,

    /// Entry point for batch commands (metadata migration, notification).
    #[serde(default = "default_main_class")]
    pub main_class: String,

    /// Java binary used to run batch commands.
    #[serde(default = "default_java_path")]
    pub java_path: PathBuf,
}

fn default_jar_path() -> String {
    "rf-batch-761c316.jar".to_string()
}

fn default_artifacts_uri() -> String {
    "s3://rasterfoundry-global-artifacts-us-east-1/batch".to_string()
}

fn default_local_jar() -> PathBuf {
    PathBuf::from("/opt/raster-foundry/jars/rf-batch.jar")
}

fn default_ingest_class() -> String {
    "com.azavea.rf.batch.ingest.spark.Ingest".to_string()
}

fn default_main_class() -> String {
    "com.azavea.rf.batch.Main".to_string()
}

fn default_java_path() -> PathBuf {
    PathBuf::from("java")
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jar_path: default_jar_path(),
            artifacts_uri: default_artifacts_uri(),
            local_jar: default_local_jar(),
            ingest_class: default_ingest_class(),
            main_class: default_main_class(),
            java_path: default_java_path(),
        }
    }
}

impl BatchConfig {
    /// Full URI of the JAR cluster steps run.
    pub fn cluster_jar_uri(&self) -> String {
        format!(
            "{}/{}",
            self.artifacts_uri.trim_end_matches('/'),
            self.jar_path.trim_start_matches('/')
        )
    }
}

/// Sizing for local-mode Spark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Path to spark-submit.
    #[serde(default = "default_spark_submit")]
    pub spark_submit: PathBuf,

    /// Worker threads for `local[N]` (LOCAL_INGEST_CORES).
    #[serde(default = "default_cores")]
    pub cores: u32,

    /// Driver memory in GB (LOCAL_INGEST_MEM_GB).
    #[serde(default = "default_memory_gb")]
    pub memory_gb: u32,
}

fn default_spark_submit() -> PathBuf {
    PathBuf::from("spark-submit")
}

fn default_cores() -> u32 {
    32
}

fn default_memory_gb() -> u32 {
    48
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            spark_submit: default_spark_submit(),
            cores: default_cores(),
            memory_gb: default_memory_gb(),
        }
    }
}

/// Managed (EMR) cluster settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// AWS region of the cluster.
    #[serde(default = "default_region")]
    pub region: String,

    /// Only clusters with this name are considered. Any active cluster when unset.
    #[serde(default)]
    pub name: Option<String>,

    /// Jar EMR runs for script steps.
    #[serde(default = "default_script_runner")]
    pub script_runner_jar: String,

    /// spark-submit path on cluster nodes.
    #[serde(default = "default_cluster_spark_submit")]
    pub spark_submit: String,

    /// First delay between step state polls, in seconds.
    #[serde(default = "default_poll_initial")]
    pub poll_initial_secs: u64,

    /// Longest delay between step state polls, in seconds.
    #[serde(default = "default_poll_max")]
    pub poll_max_secs: u64,

    /// Give up waiting for a step after this many seconds.
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_script_runner() -> String {
    "s3://us-east-1.elasticmapreduce/libs/script-runner/script-runner.jar".to_string()
}

fn default_cluster_spark_submit() -> String {
    "/usr/bin/spark-submit".to_string()
}

fn default_poll_initial() -> u64 {
    15
}

fn default_poll_max() -> u64 {
    60
}

fn default_max_wait() -> u64 {
    7200 // 2 hours
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            name: None,
            script_runner_jar: default_script_runner(),
            spark_submit: default_cluster_spark_submit(),
            poll_initial_secs: default_poll_initial(),
            poll_max_secs: default_poll_max(),
            max_wait_secs: default_max_wait(),
        }
    }
}

impl ClusterConfig {
    pub fn poll_initial(&self) -> Duration {
        Duration::from_secs(self.poll_initial_secs)
    }

    pub fn poll_max(&self) -> Duration {
        Duration::from_secs(self.poll_max_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}
