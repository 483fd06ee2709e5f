//! Mock blob store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{BlobStore, StorageError};

/// A recorded blob store call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedBlobOp {
    Put { key: String },
    Get { key: String },
    Delete { key: String },
}

impl RecordedBlobOp {
    /// Whether this call changed storage.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Put { .. } | Self::Delete { .. })
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Put { key } | Self::Get { key } | Self::Delete { key } => key,
        }
    }
}

/// In-memory [`BlobStore`] that records every call.
///
/// # Example
///
/// ```rust,ignore
/// use rf_ingest_core::testing::MockBlobStore;
///
/// let blobs = MockBlobStore::new();
/// blobs.fail_next_puts(2).await;
///
/// // The first two puts fail, the third succeeds.
/// ```
#[derive(Debug)]
pub struct MockBlobStore {
    /// Stored objects by key.
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Recorded calls, in order.
    ops: Arc<RwLock<Vec<RecordedBlobOp>>>,
    /// Number of upcoming puts that fail.
    put_failures: Arc<RwLock<u32>>,
    /// Objects planted beside every put under a watched prefix.
    plants: Arc<RwLock<Vec<Plant>>>,
}

#[derive(Debug, Clone)]
struct Plant {
    watch_prefix: String,
    plant_prefix: String,
    bytes: Vec<u8>,
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBlobStore {
    /// Create a new empty mock blob store.
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            ops: Arc::new(RwLock::new(Vec::new())),
            put_failures: Arc::new(RwLock::new(0)),
            plants: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get all recorded calls.
    pub async fn ops(&self) -> Vec<RecordedBlobOp> {
        self.ops.read().await.clone()
    }

    /// Get recorded puts and deletes.
    pub async fn writes(&self) -> Vec<RecordedBlobOp> {
        self.ops
            .read()
            .await
            .iter()
            .filter(|op| op.is_write())
            .cloned()
            .collect()
    }

    /// Get a stored object.
    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    /// Keys of all stored objects, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Pre-populate an object without recording a call.
    pub async fn insert_object(&self, key: &str, bytes: Vec<u8>) {
        self.objects.write().await.insert(key.to_string(), bytes);
    }

    /// Make the next `count` puts fail.
    pub async fn fail_next_puts(&self, count: u32) {
        *self.put_failures.write().await = count;
    }

    /// Whenever a key under `watch_prefix` is put, also store `bytes` under
    /// the same file name in `plant_prefix`, without recording a call.
    ///
    /// Simulates a leftover object that already exists the moment its
    /// sibling is written.
    pub async fn plant_on_put(&self, watch_prefix: &str, plant_prefix: &str, bytes: Vec<u8>) {
        self.plants.write().await.push(Plant {
            watch_prefix: format!("{}/", watch_prefix.trim_matches('/')),
            plant_prefix: format!("{}/", plant_prefix.trim_matches('/')),
            bytes,
        });
    }

    async fn record(&self, op: RecordedBlobOp) {
        self.ops.write().await.push(op);
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    fn name(&self) -> &str {
        "mock"
    }

    fn uri_for(&self, key: &str) -> String {
        format!("mock://blobs/{}", key)
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        self.record(RecordedBlobOp::Put {
            key: key.to_string(),
        })
        .await;

        {
            let mut failures = self.put_failures.write().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "mock put failure",
                )));
            }
        }

        let mut objects = self.objects.write().await;
        for plant in self.plants.read().await.iter() {
            if let Some(name) = key.strip_prefix(&plant.watch_prefix) {
                objects.insert(format!("{}{}", plant.plant_prefix, name), plant.bytes.clone());
            }
        }
        objects.insert(key.to_string(), bytes);
        Ok(self.uri_for(key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.record(RecordedBlobOp::Get {
            key: key.to_string(),
        })
        .await;

        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.record(RecordedBlobOp::Delete {
            key: key.to_string(),
        })
        .await;

        self.objects.write().await.remove(key);
        Ok(())
    }
}
