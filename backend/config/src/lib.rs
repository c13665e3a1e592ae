//! `tracelog-config`: configuration for the tracelog runtime.
//!
//! Provides:
//! - Run-mode parsing and the defaults each mode implies
//! - The typed [`OutputConfiguration`] schema (sinks, sampling, rotation, alerting)
//! - The severity policy table
//! - Validation of configuration errors that must stop initialization
//! - TOML/YAML/JSON loading with `${ENV_VAR}` substitution and `TRACELOG_*` overrides

pub mod defaults;
pub mod env;
pub mod error;
pub mod io;
pub mod policy;
pub mod run_mode;
pub mod schema;
pub mod sink;
pub mod validation;

pub use env::{apply_env_overrides, apply_env_overrides_with, substitute_env_vars_with};
pub use error::ConfigError;
pub use io::{ConfigFormat, load_config, parse_config};
pub use policy::{SeverityAction, SeverityPolicy};
pub use run_mode::RunMode;
pub use schema::{
    AlertConfig, Encoding, OutputConfiguration, OutputKinds, RotationConfig, SamplingConfig, host_name,
};
pub use sink::SinkAddress;
pub use validation::validate;
