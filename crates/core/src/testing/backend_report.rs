//! Status record a mock backend writes when a job finishes.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::scene::IngestStatus;
use crate::status::{IngestStatusRecord, StatusStore};

/// What a mocked batch job reports back through the status store.
#[derive(Clone, Default)]
pub(crate) struct BackendReport {
    store: Option<StatusStore>,
    /// `None` means the job writes no record at all.
    status: Arc<RwLock<Option<IngestStatus>>>,
    /// Overrides the scene id written into the record.
    scene_id: Arc<RwLock<Option<String>>>,
}

impl BackendReport {
    pub(crate) fn new(store: StatusStore) -> Self {
        Self {
            store: Some(store),
            status: Arc::new(RwLock::new(Some(IngestStatus::Ingested))),
            scene_id: Arc::new(RwLock::new(None)),
        }
    }

    pub(crate) async fn set_status(&self, status: Option<IngestStatus>) {
        *self.status.write().await = status;
    }

    pub(crate) async fn set_scene_id(&self, scene_id: Option<String>) {
        *self.scene_id.write().await = scene_id;
    }

    pub(crate) async fn write(&self, definition_id: &str, scene_id: &str) {
        let Some(store) = &self.store else {
            return;
        };
        let Some(status) = *self.status.read().await else {
            return;
        };
        let scene_id = self
            .scene_id
            .read()
            .await
            .clone()
            .unwrap_or_else(|| scene_id.to_string());

        let record = IngestStatusRecord::new(definition_id, scene_id, status);
        if let Err(e) = store.write(definition_id, &record).await {
            tracing::warn!(definition_id, error = %e, "Mock backend could not write status record");
        }
    }
}
