//! Ingest definition wire types.

use serde::{Deserialize, Serialize};

/// Serialized job spec consumed by the batch ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestDefinition {
    /// Unique per submission.
    pub id: String,
    /// Location once persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub scene_id: String,
    pub layers: Vec<IngestLayer>,
}

/// One output layer and the sources that feed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestLayer {
    pub id: String,
    pub output: OutputDefinition,
    pub sources: Vec<SourceDefinition>,
}

/// Where and how the tiled layer is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDefinition {
    pub uri: String,
    pub crs: String,
    pub cell_type: String,
    pub pyramid: bool,
    pub native: bool,
}

/// One source raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDefinition {
    pub uri: String,
    pub band_maps: Vec<BandMapping>,
}

/// Maps a 0-based band of the source to a 0-based band of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandMapping {
    pub source: u32,
    pub target: u32,
}

impl SourceDefinition {
    /// Single-band source mapped to `target`.
    pub fn single_band(uri: impl Into<String>, target: u32) -> Self {
        Self {
            uri: uri.into(),
            band_maps: vec![BandMapping { source: 0, target }],
        }
    }
}

impl IngestDefinition {
    /// All band targets across every layer's sources, in order.
    pub fn targets(&self) -> Vec<u32> {
        self.layers
            .iter()
            .flat_map(|l| l.sources.iter())
            .flat_map(|s| s.band_maps.iter().map(|m| m.target))
            .collect()
    }
}
