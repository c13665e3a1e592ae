//! Config file loading.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::env::{apply_env_overrides_with, substitute_env_vars_with};
use crate::error::ConfigError;
use crate::schema::OutputConfiguration;
use crate::validation::validate;

/// On-disk formats, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Json => "json",
        }
    }
}

/// Parse, substitute `${VAR}`s, apply overrides and validate.
pub fn parse_config(
    raw: &str,
    format: ConfigFormat,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<OutputConfiguration, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse { format: format.name(), message };
    let value: Value = match format {
        ConfigFormat::Toml => toml::from_str(raw).map_err(|e| parse_err(e.to_string()))?,
        ConfigFormat::Yaml => serde_yaml::from_str(raw).map_err(|e| parse_err(e.to_string()))?,
        ConfigFormat::Json => serde_json::from_str(raw).map_err(|e| parse_err(e.to_string()))?,
    };
    let value = substitute_env_vars_with(&value, lookup)?;
    let mut config: OutputConfiguration =
        serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))?;
    apply_env_overrides_with(&mut config, lookup)?;
    validate(&config)?;
    Ok(config)
}

/// Load a configuration file from disk using the process environment.
pub async fn load_config(path: &Path) -> Result<OutputConfiguration> {
    let format = ConfigFormat::from_path(path)
        .with_context(|| format!("Unsupported config file extension: {}", path.display()))?;
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = parse_config(&raw, format, &|name| std::env::var(name).ok())
        .with_context(|| format!("Invalid logging config at: {}", path.display()))?;
    debug!(path = %path.display(), component = %config.component, "Loaded logging config");
    Ok(config)
}
