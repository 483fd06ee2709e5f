//! Error types for the post-ingest hooks.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    /// The command could not be started.
    #[error("Failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("{command} exited with code {exit_code:?}")]
    Failed {
        command: String,
        exit_code: Option<i32>,
    },
}
