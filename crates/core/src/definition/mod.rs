//! Ingest definitions: the job spec the batch ingest consumes.
//!
//! A definition is built from a scene by one of three strategies selected by
//! the scene's datasource ([`DatasourceKind`]), then persisted to blob storage
//! under a key derived from its fresh id.

mod builder;
mod datasource;
mod error;
mod types;

pub use builder::JobDefinitionBuilder;
pub use datasource::{
    DatasourceConfig, DatasourceKind, LANDSAT8_DATASOURCE_ID, SENTINEL2_DATASOURCE_IDS,
};
pub use error::DefinitionError;
pub use types::{BandMapping, IngestDefinition, IngestLayer, OutputDefinition, SourceDefinition};
