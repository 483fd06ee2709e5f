//! Datasource classification.

use serde::{Deserialize, Serialize};

/// Landsat 8 datasource id.
pub const LANDSAT8_DATASOURCE_ID: &str = "697a0b91-b7a8-446e-842c-97cda155554d";

/// Sentinel-2 datasource ids (one per provider family member).
pub const SENTINEL2_DATASOURCE_IDS: [&str; 2] = [
    "4a50cb75-815d-4fe5-8bc1-144729ce5b42",
    "c33db82d-afdb-43cb-a6ac-ba899e48638d",
];

/// Datasource ids that get a dedicated definition strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasourceConfig {
    /// Landsat 8 datasource id.
    #[serde(default = "default_landsat8")]
    pub landsat8: String,

    /// Sentinel-2 datasource ids.
    #[serde(default = "default_sentinel2")]
    pub sentinel2: Vec<String>,

    /// Root of the public Landsat 8 Collection 1 archive.
    #[serde(default = "default_landsat_root")]
    pub landsat_root: String,
}

fn default_landsat8() -> String {
    LANDSAT8_DATASOURCE_ID.to_string()
}

fn default_sentinel2() -> Vec<String> {
    SENTINEL2_DATASOURCE_IDS
        .iter()
        .map(|id| id.to_string())
        .collect()
}

fn default_landsat_root() -> String {
    "s3://landsat-pds/c1/L8".to_string()
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            landsat8: default_landsat8(),
            sentinel2: default_sentinel2(),
            landsat_root: default_landsat_root(),
        }
    }
}

/// Definition strategy for a datasource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasourceKind {
    Landsat8,
    Sentinel2,
    Generic,
}

impl DatasourceKind {
    /// Selects the strategy for `datasource`. Pure: depends only on the
    /// identifier and the configured id lists.
    pub fn classify(datasource: &str, config: &DatasourceConfig) -> Self {
        if datasource == config.landsat8 {
            DatasourceKind::Landsat8
        } else if config.sentinel2.iter().any(|id| id == datasource) {
            DatasourceKind::Sentinel2
        } else {
            DatasourceKind::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasourceKind::Landsat8 => "landsat8",
            DatasourceKind::Sentinel2 => "sentinel2",
            DatasourceKind::Generic => "generic",
        }
    }
}
