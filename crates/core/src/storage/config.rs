//! Configuration for blob storage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which `object_store` backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    S3,
    Local,
    Memory,
}

/// Configuration for where ingest definitions and status records live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend.
    #[serde(default = "default_backend")]
    pub backend: StorageBackendKind,

    /// Bucket holding definitions and status records (S3 backend).
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// AWS region of the bucket.
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3 endpoint (MinIO, localstack).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Root directory for the local backend.
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// Key prefix for ingest definitions.
    #[serde(default = "default_definitions_prefix")]
    pub definitions_prefix: String,

    /// Key prefix for status records written by the batch job.
    #[serde(default = "default_status_prefix")]
    pub status_prefix: String,
}

fn default_backend() -> StorageBackendKind {
    StorageBackendKind::S3
}

fn default_bucket() -> String {
    "rasterfoundry-development-data-us-east-1".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_local_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_definitions_prefix() -> String {
    "ingest-definitions".to_string()
}

fn default_status_prefix() -> String {
    "ingest-status".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            bucket: default_bucket(),
            region: default_region(),
            endpoint: None,
            local_root: default_local_root(),
            definitions_prefix: default_definitions_prefix(),
            status_prefix: default_status_prefix(),
        }
    }
}

impl StorageConfig {
    /// Key of the ingest definition with the given id.
    pub fn definition_key(&self, definition_id: &str) -> String {
        join_key(&self.definitions_prefix, definition_id)
    }

    /// Key of the status record for the given definition id.
    pub fn status_key(&self, definition_id: &str) -> String {
        join_key(&self.status_prefix, definition_id)
    }
}

fn join_key(prefix: &str, id: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}.json", id)
    } else {
        format!("{}/{}.json", prefix, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, StorageBackendKind::S3);
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_keys_are_deterministic() {
        let config = StorageConfig::default();
        assert_eq!(
            config.definition_key("abc"),
            "ingest-definitions/abc.json"
        );
        assert_eq!(config.status_key("abc"), "ingest-status/abc.json");
        assert_eq!(config.definition_key("abc"), config.definition_key("abc"));
    }

    #[test]
    fn test_keys_trim_slashes_and_empty_prefix() {
        let config = StorageConfig {
            definitions_prefix: "/defs/".to_string(),
            status_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(config.definition_key("x"), "defs/x.json");
        assert_eq!(config.status_key("x"), "x.json");
    }

    #[test]
    fn test_deserialize_backend() {
        let config: StorageConfig = toml::from_str(r#"backend = "memory""#).unwrap();
        assert_eq!(config.backend, StorageBackendKind::Memory);
    }
}
