//! Status record types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::IngestStatus;
use crate::storage::StorageError;

/// Result record written once by the execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStatusRecord {
    /// Absent in records written by older batch jars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_definition_id: Option<String>,
    pub scene_id: String,
    pub ingest_status: IngestStatus,
}

impl IngestStatusRecord {
    pub fn new(
        ingest_definition_id: impl Into<String>,
        scene_id: impl Into<String>,
        ingest_status: IngestStatus,
    ) -> Self {
        Self {
            ingest_definition_id: Some(ingest_definition_id.into()),
            scene_id: scene_id.into(),
            ingest_status,
        }
    }
}

/// Errors reading or writing status records.
#[derive(Debug, Error)]
pub enum StatusError {
    /// No record has been written for the definition yet.
    #[error("no status record for ingest definition {definition_id}")]
    Missing { definition_id: String },

    /// The record exists but could not be parsed.
    #[error("malformed status record at {key}: {reason}")]
    Malformed { key: String, reason: String },

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
