//! Dispatch of ingest jobs to an execution backend.
//!
//! Two backends exist:
//! - **Local**: `spark-submit` in local mode as a child process, awaited to
//!   completion.
//! - **Managed**: one step on an already-running EMR cluster, polled until it
//!   reaches a terminal state.
//!
//! # Example
//!
//! ```ignore
//! use rf_ingest_core::dispatch::{ClusterDispatcher, DispatchMode, IngestJob, Submission};
//!
//! let job = IngestJob::new("scene-1", "def-1", "s3://bucket/ingest-definitions/def-1.json");
//! match dispatcher.submit(&job, DispatchMode::Managed).await? {
//!     Submission::Step { cluster, step } => {
//!         let succeeded = dispatcher.await_completion(&step, &cluster).await?;
//!     }
//!     Submission::Finished => {}
//! }
//! ```

mod cluster;
mod config;
mod dispatcher;
mod emr;
mod error;
mod local;
mod types;

pub use cluster::{ingest_step, ClusterApi};
pub use config::{BatchConfig, ClusterConfig, LocalConfig};
pub use dispatcher::ClusterDispatcher;
pub use emr::EmrClusterApi;
pub use error::DispatchError;
pub use local::{LocalExecutor, SparkLocalExecutor};
pub use types::{
    ClusterHandle, DispatchMode, IngestJob, StepHandle, StepSpec, StepState, Submission,
};
