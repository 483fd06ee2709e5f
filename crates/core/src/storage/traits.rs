//! Trait definitions for blob storage.

use async_trait::async_trait;

use super::error::StorageError;

/// Key/value blob storage addressed by string keys.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Renders the URI other systems use to reach `key`.
    fn uri_for(&self, key: &str) -> String;

    /// Stores `bytes` under `key`, replacing any previous object, and returns
    /// the object's URI.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, StorageError>;

    /// Reads the object under `key`.
    ///
    /// Returns [`StorageError::NotFound`] when the key does not exist.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Deletes the object under `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
