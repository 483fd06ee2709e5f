//! `object_store`-backed blob store.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tracing::{debug, info};

use super::config::{StorageBackendKind, StorageConfig};
use super::error::StorageError;
use super::traits::BlobStore;

/// Blob store over any `object_store` backend.
pub struct ObjectBlobStore {
    store: Arc<dyn ObjectStore>,
    uri_root: String,
    name: &'static str,
}

impl ObjectBlobStore {
    /// Wraps an existing object store. `uri_root` is prepended to keys when
    /// rendering URIs (e.g. `s3://bucket`).
    pub fn new(store: Arc<dyn ObjectStore>, uri_root: impl Into<String>) -> Self {
        Self {
            store,
            uri_root: uri_root.into().trim_end_matches('/').to_string(),
            name: "object_store",
        }
    }

    /// Builds the backend selected in configuration.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match config.backend {
            StorageBackendKind::S3 => Self::s3(config),
            StorageBackendKind::Local => Self::local(&config.local_root),
            StorageBackendKind::Memory => Ok(Self::in_memory(&config.bucket)),
        }
    }

    /// S3 backend for `config.bucket`.
    pub fn s3(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::NotConfigured("storage.bucket not set".into()));
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_region(&config.region)
            .with_bucket_name(&config.bucket);

        if let Some(ref endpoint) = config.endpoint {
            if !endpoint.is_empty() {
                builder = builder
                    .with_endpoint(endpoint)
                    .with_allow_http(endpoint.starts_with("http://"));
            }
        }

        let store = builder.build()?;
        info!(
            "Storage: S3 backend s3://{} (region: {})",
            config.bucket, config.region
        );

        Ok(Self {
            store: Arc::new(store),
            uri_root: format!("s3://{}", config.bucket),
            name: "s3",
        })
    }

    /// Local filesystem backend rooted at `root`, created if missing.
    pub fn local(root: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root)?;
        let canonical = std::fs::canonicalize(root)?;
        let store = LocalFileSystem::new_with_prefix(&canonical)?;
        info!("Storage: local backend at {}", canonical.display());

        Ok(Self {
            store: Arc::new(store),
            uri_root: format!("file://{}", canonical.display()),
            name: "local",
        })
    }

    /// In-memory backend; contents vanish with the process.
    pub fn in_memory(label: &str) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            uri_root: format!("memory://{}", label),
            name: "memory",
        }
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    fn name(&self) -> &str {
        self.name
    }

    fn uri_for(&self, key: &str) -> String {
        format!("{}/{}", self.uri_root, key.trim_start_matches('/'))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let path = ObjectPath::from(key);
        let size = bytes.len();
        self.store.put(&path, Bytes::from(bytes).into()).await?;
        debug!(key, size, "Stored object");
        Ok(self.uri_for(key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = ObjectPath::from(key);
        match self.store.get(&path).await {
            Ok(result) => Ok(result.bytes().await?.to_vec()),
            Err(object_store::Error::NotFound { .. }) => Err(StorageError::not_found(key)),
            Err(e) => Err(StorageError::ObjectStore(e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = ObjectPath::from(key);
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!(key, "Deleted object");
                Ok(())
            }
            Err(e) => Err(StorageError::ObjectStore(e)),
        }
    }
}
