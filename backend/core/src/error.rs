use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the tracelog runtime.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log rotation failed for {path}: {source}")]
    Rotation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sink `{sink}` failed: {message}")]
    Sink { sink: String, message: String },

    #[error("record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("a tokio runtime is required for {0}")]
    RuntimeUnavailable(&'static str),

    #[error("logger has been shut down")]
    ShutDown,
}
