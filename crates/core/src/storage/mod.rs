//! Blob storage for ingest definitions and status records.
//!
//! [`BlobStore`] is the narrow `put`/`get`/`delete` contract the rest of the
//! crate uses. [`ObjectBlobStore`] implements it over `object_store`, so the
//! same code runs against S3, a local directory, or memory.

mod config;
mod error;
mod object;
mod traits;

pub use config::{StorageBackendKind, StorageConfig};
pub use error::StorageError;
pub use object::ObjectBlobStore;
pub use traits::BlobStore;
