use thiserror::Error;
use tracelog_core::LogError;

use crate::run_mode::RunMode;
use crate::schema::Encoding;

/// Configuration errors. All of them are fatal at initialization.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid run mode: {0:?}")]
    InvalidRunMode(String),

    #[error("{encoding} encoder can only be used in dev and debug environment (run mode: {run_mode})")]
    InvalidEncoder { encoding: Encoding, run_mode: RunMode },

    #[error("invalid log level: {0:?}")]
    InvalidLevel(String),

    #[error("invalid sampling configuration: {0}")]
    InvalidSampling(String),

    #[error("invalid rotation configuration: {0}")]
    InvalidRotation(String),

    #[error("invalid alert configuration: {0}")]
    InvalidAlert(String),

    #[error("invalid severity policy: {0}")]
    InvalidSeverityPolicy(String),

    #[error("unknown sink address: {0:?}")]
    UnknownSink(String),

    #[error("component name must not be empty")]
    EmptyComponent,

    #[error("missing env var \"{var_name}\" referenced at config path: {config_path}")]
    MissingEnvVar { var_name: String, config_path: String },

    #[error("failed to parse {format} config: {message}")]
    Parse { format: &'static str, message: String },
}

impl From<ConfigError> for LogError {
    fn from(err: ConfigError) -> Self {
        LogError::Config(err.to_string())
    }
}
