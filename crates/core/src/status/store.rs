//! Status store over blob storage.

use std::sync::Arc;

use tracing::debug;

use super::types::{IngestStatusRecord, StatusError};
use crate::storage::{BlobStore, StorageConfig, StorageError};

/// Reads, writes and clears status records keyed by ingest definition id.
#[derive(Clone)]
pub struct StatusStore {
    blobs: Arc<dyn BlobStore>,
    config: StorageConfig,
}

impl StatusStore {
    pub fn new(blobs: Arc<dyn BlobStore>, config: StorageConfig) -> Self {
        Self { blobs, config }
    }

    /// Key the backend writes the record for `definition_id` to.
    pub fn key_for(&self, definition_id: &str) -> String {
        self.config.status_key(definition_id)
    }

    /// Reads the record for `definition_id`, or `None` if none exists yet.
    pub async fn read(
        &self,
        definition_id: &str,
    ) -> Result<Option<IngestStatusRecord>, StatusError> {
        let key = self.key_for(definition_id);
        let bytes = match self.blobs.get(&key).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut record: IngestStatusRecord =
            serde_json::from_slice(&bytes).map_err(|e| StatusError::Malformed {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        if record.ingest_definition_id.is_none() {
            record.ingest_definition_id = Some(definition_id.to_string());
        }

        debug!(key = %key, status = %record.ingest_status, "Read status record");
        Ok(Some(record))
    }

    /// Reads the record, failing with [`StatusError::Missing`] if absent.
    pub async fn require(&self, definition_id: &str) -> Result<IngestStatusRecord, StatusError> {
        self.read(definition_id)
            .await?
            .ok_or_else(|| StatusError::Missing {
                definition_id: definition_id.to_string(),
            })
    }

    /// Writes a record under its definition id.
    pub async fn write(
        &self,
        definition_id: &str,
        record: &IngestStatusRecord,
    ) -> Result<String, StatusError> {
        let key = self.key_for(definition_id);
        let bytes = serde_json::to_vec(record).map_err(|e| StatusError::Malformed {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        Ok(self.blobs.put(&key, bytes).await?)
    }

    /// Removes any record for `definition_id`.
    pub async fn delete(&self, definition_id: &str) -> Result<(), StatusError> {
        let key = self.key_for(definition_id);
        self.blobs.delete(&key).await?;
        debug!(key = %key, "Cleared status record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::IngestStatus;
    use crate::storage::ObjectBlobStore;

    fn store() -> (StatusStore, Arc<dyn BlobStore>) {
        let blobs: Arc<dyn BlobStore> = Arc::new(ObjectBlobStore::in_memory("status"));
        (
            StatusStore::new(Arc::clone(&blobs), StorageConfig::default()),
            blobs,
        )
    }

    #[tokio::test]
    async fn test_read_absent_is_none() {
        let (store, _) = store();
        assert!(store.read("d1").await.unwrap().is_none());
        assert!(matches!(
            store.require("d1").await,
            Err(StatusError::Missing { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_fills_definition_id() {
        let (store, blobs) = store();
        blobs
            .put(
                "ingest-status/d1.json",
                br#"{"sceneId":"s1","ingestStatus":"FAILED"}"#.to_vec(),
            )
            .await
            .unwrap();

        let record = store.require("d1").await.unwrap();
        assert_eq!(record.ingest_definition_id.as_deref(), Some("d1"));
        assert_eq!(record.ingest_status, IngestStatus::Failed);
    }

    #[tokio::test]
    async fn test_malformed_record() {
        let (store, blobs) = store();
        blobs
            .put("ingest-status/d1.json", b"not json".to_vec())
            .await
            .unwrap();

        assert!(matches!(
            store.read("d1").await,
            Err(StatusError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_clears_record() {
        let (store, _) = store();
        store
            .write("d1", &IngestStatusRecord::new("d1", "s1", IngestStatus::Ingested))
            .await
            .unwrap();
        assert!(store.read("d1").await.unwrap().is_some());

        store.delete("d1").await.unwrap();
        assert!(store.read("d1").await.unwrap().is_none());
    }
}
