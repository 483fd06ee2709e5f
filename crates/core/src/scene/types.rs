//! Core scene data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ingest state of a scene, as stored by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngestStatus {
    #[serde(rename = "NOTINGESTED")]
    NotIngested,
    #[serde(rename = "TOBEINGESTED")]
    ToBeIngested,
    #[serde(rename = "INGESTING")]
    Ingesting,
    /// Terminal success. Batch jobs have also written this as `COMPLETED`.
    #[serde(rename = "INGESTED", alias = "COMPLETED")]
    Ingested,
    #[serde(rename = "FAILED")]
    Failed,
}

impl IngestStatus {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStatus::NotIngested => "NOTINGESTED",
            IngestStatus::ToBeIngested => "TOBEINGESTED",
            IngestStatus::Ingesting => "INGESTING",
            IngestStatus::Ingested => "INGESTED",
            IngestStatus::Failed => "FAILED",
        }
    }

    /// Whether a new ingest may start from this status without an override.
    pub fn is_ingestible(&self) -> bool {
        matches!(self, IngestStatus::ToBeIngested | IngestStatus::Failed)
    }
}

impl fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NOTINGESTED" => Ok(IngestStatus::NotIngested),
            "TOBEINGESTED" => Ok(IngestStatus::ToBeIngested),
            "INGESTING" => Ok(IngestStatus::Ingesting),
            "INGESTED" | "COMPLETED" => Ok(IngestStatus::Ingested),
            "FAILED" => Ok(IngestStatus::Failed),
            other => Err(format!("unknown ingest status: {}", other)),
        }
    }
}

/// One band of a source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    /// 1-based band index within the source file.
    pub number: u32,
}

/// A source image belonging to a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneImage {
    pub source_uri: String,
    #[serde(default)]
    pub bands: Vec<Band>,
}

/// One imagery asset tracked by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub owner: String,
    /// Provider scene name (e.g. a Landsat product id).
    #[serde(default)]
    pub name: String,
    /// Datasource id; selects the ingest definition strategy.
    pub datasource: String,
    pub ingest_status: IngestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_location: Option<String>,
    #[serde(default)]
    pub images: Vec<SceneImage>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by every successful update.
    #[serde(default)]
    pub version: u64,
}

impl Scene {
    /// Creates a scene waiting to be ingested.
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<String>,
        datasource: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner: owner.into(),
            name: String::new(),
            datasource: datasource.into(),
            ingest_status: IngestStatus::ToBeIngested,
            ingest_location: None,
            images: Vec::new(),
            created_at: now,
            modified_at: now,
            version: 0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_status(mut self, status: IngestStatus) -> Self {
        self.ingest_status = status;
        self
    }

    pub fn with_image(mut self, image: SceneImage) -> Self {
        self.images.push(image);
        self
    }
}
