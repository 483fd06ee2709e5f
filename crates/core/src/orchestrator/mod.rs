//! Ingest orchestrator.
//!
//! Drives a scene through the ingest state machine:
//! - **Queued**: scene loaded, entry guard checked
//! - **Submitting**: scene marked `INGESTING`, definition built and uploaded
//! - **Running**: job running on the selected backend
//! - **Completed** / **Failed**: status record read, scene updated, hooks run

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::IngestOrchestrator;
pub use types::{IngestError, IngestErrorKind, IngestOutcome, IngestPhase, IngestRequest};
