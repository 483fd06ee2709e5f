//! Mock local executor for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::backend_report::BackendReport;
use crate::dispatch::{DispatchError, IngestJob, LocalExecutor};
use crate::scene::IngestStatus;
use crate::status::StatusStore;

/// Mock implementation of the LocalExecutor trait.
///
/// Records every job and exits with a configurable code. With
/// [`writing_status`](Self::writing_status) a successful run also writes the
/// status record the batch job would.
#[derive(Clone)]
pub struct MockLocalExecutor {
    runs: Arc<RwLock<Vec<IngestJob>>>,
    exit_code: Arc<RwLock<i32>>,
    report: BackendReport,
}

impl Default for MockLocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLocalExecutor {
    /// Create a mock whose runs exit 0.
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(Vec::new())),
            exit_code: Arc::new(RwLock::new(0)),
            report: BackendReport::default(),
        }
    }

    pub fn writing_status(mut self, store: StatusStore) -> Self {
        self.report = BackendReport::new(store);
        self
    }

    pub async fn set_exit_code(&self, code: i32) {
        *self.exit_code.write().await = code;
    }

    /// Status the job reports; `None` writes no record.
    pub async fn set_reported_status(&self, status: Option<IngestStatus>) {
        self.report.set_status(status).await;
    }

    /// Jobs that were run.
    pub async fn runs(&self) -> Vec<IngestJob> {
        self.runs.read().await.clone()
    }
}

#[async_trait]
impl LocalExecutor for MockLocalExecutor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, job: &IngestJob) -> Result<(), DispatchError> {
        self.runs.write().await.push(job.clone());

        let code = *self.exit_code.read().await;
        if code != 0 {
            return Err(DispatchError::execution(
                format!("mock ingest exited with {}", code),
                Some(code),
            ));
        }

        self.report.write(&job.definition_id, &job.scene_id).await;
        Ok(())
    }
}
