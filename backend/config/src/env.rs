//! Environment variable handling for config values.
//!
//! `${VAR_NAME}` references in string values are resolved at load time
//! (uppercase `[A-Z_][A-Z0-9_]*` names only). `TRACELOG_RUN_MODE` and
//! `TRACELOG_LEVEL` override the loaded file.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracelog_core::Level;

use crate::error::ConfigError;
use crate::run_mode::RunMode;
use crate::schema::OutputConfiguration;

pub const RUN_MODE_ENV: &str = "TRACELOG_RUN_MODE";
pub const LEVEL_ENV: &str = "TRACELOG_LEVEL";

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap_or_else(|e| panic!("invalid env pattern: {e}"))
});

/// Substitute `${VAR}` references in every string leaf of `value`.
///
/// A referenced variable that is unset or empty is an error naming the
/// config path where it appeared.
pub fn substitute_env_vars_with(
    value: &Value,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<Value, ConfigError> {
    substitute_value(value, lookup, "")
}

fn substitute_value(
    value: &Value,
    lookup: &dyn Fn(&str) -> Option<String>,
    path: &str,
) -> Result<Value, ConfigError> {
    match value {
        Value::String(s) => substitute_string(s, lookup, path).map(Value::String),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, lookup, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                out.insert(key.clone(), substitute_value(v, lookup, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    path: &str,
) -> Result<String, ConfigError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for caps in ENV_VAR_PATTERN.captures_iter(s) {
        let Some(whole) = caps.get(0) else { continue };
        let name = &caps[1];
        let value = lookup(name).filter(|v| !v.is_empty()).ok_or_else(|| ConfigError::MissingEnvVar {
            var_name: name.to_string(),
            config_path: path.to_string(),
        })?;
        out.push_str(&s[last..whole.start()]);
        out.push_str(&value);
        last = whole.end();
    }
    out.push_str(&s[last..]);
    Ok(out)
}

/// Apply `TRACELOG_RUN_MODE` / `TRACELOG_LEVEL` from `lookup`.
pub fn apply_env_overrides_with(
    config: &mut OutputConfiguration,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(raw) = lookup(RUN_MODE_ENV).filter(|v| !v.trim().is_empty()) {
        config.run_mode = raw.parse::<RunMode>()?;
    }
    if let Some(raw) = lookup(LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
        let level = raw.parse::<Level>().map_err(|_| ConfigError::InvalidLevel(raw.clone()))?;
        config.level = Some(level);
    }
    Ok(())
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut OutputConfiguration) -> Result<(), ConfigError> {
    apply_env_overrides_with(config, &|name| std::env::var(name).ok())
}
