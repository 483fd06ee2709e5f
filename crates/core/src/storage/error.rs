//! Error types for blob storage.

use thiserror::Error;

/// Errors returned by a [`BlobStore`](super::BlobStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object exists under the key.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The underlying object store failed.
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// The backend is missing required configuration.
    #[error("storage not configured: {0}")]
    NotConfigured(String),

    /// I/O error preparing a local backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Creates a not-found error for the given key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }
}
