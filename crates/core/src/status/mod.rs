//! Ingest status records written by the batch job on completion.
//!
//! A record lives in blob storage under a key derived from its ingest
//! definition id. The orchestrator deletes any record under a fresh id before
//! dispatch, then reads the record the backend writes.

mod store;
mod types;

pub use store::StatusStore;
pub use types::{IngestStatusRecord, StatusError};
