//! Mock post-ingest hooks for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::hooks::{HookError, IngestHooks};

/// Records metadata writes and notifications.
#[derive(Debug, Clone, Default)]
pub struct MockIngestHooks {
    /// `(layer_uri, scene_id)` pairs.
    metadata_calls: Arc<RwLock<Vec<(String, String)>>>,
    notifications: Arc<RwLock<Vec<String>>>,
    fail_metadata: Arc<RwLock<bool>>,
    fail_notify: Arc<RwLock<bool>>,
}

impl MockIngestHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn metadata_calls(&self) -> Vec<(String, String)> {
        self.metadata_calls.read().await.clone()
    }

    /// Scene ids notified, in order.
    pub async fn notifications(&self) -> Vec<String> {
        self.notifications.read().await.clone()
    }

    /// Make every metadata write fail with a non-zero exit.
    pub async fn set_fail_metadata(&self, fail: bool) {
        *self.fail_metadata.write().await = fail;
    }

    /// Make every notification fail with a non-zero exit.
    pub async fn set_fail_notify(&self, fail: bool) {
        *self.fail_notify.write().await = fail;
    }
}

#[async_trait]
impl IngestHooks for MockIngestHooks {
    async fn write_metadata(&self, layer_uri: &str, scene_id: &str) -> Result<(), HookError> {
        self.metadata_calls
            .write()
            .await
            .push((layer_uri.to_string(), scene_id.to_string()));

        if *self.fail_metadata.read().await {
            return Err(HookError::Failed {
                command: "migration_s3_postgres".to_string(),
                exit_code: Some(1),
            });
        }
        Ok(())
    }

    async fn notify(&self, scene_id: &str) -> Result<(), HookError> {
        self.notifications.write().await.push(scene_id.to_string());

        if *self.fail_notify.read().await {
            return Err(HookError::Failed {
                command: "notify_ingest_status".to_string(),
                exit_code: Some(1),
            });
        }
        Ok(())
    }
}
