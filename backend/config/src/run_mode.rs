use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracelog_core::Level;

use crate::error::ConfigError;

/// Deployment environment. Test and dev count as development;
/// pre-release and production count as production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RunMode {
    Debug,
    Dev,
    Test,
    Pre,
    Prod,
    Release,
}

impl RunMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            RunMode::Debug => "DEBUG",
            RunMode::Dev => "DEV",
            RunMode::Test => "TEST",
            RunMode::Pre => "PRE",
            RunMode::Prod => "PROD",
            RunMode::Release => "RELEASE",
        }
    }

    pub const fn is_development(self) -> bool {
        matches!(self, RunMode::Debug | RunMode::Dev | RunMode::Test)
    }

    /// Threshold a fresh logger starts with.
    pub const fn default_level(self) -> Level {
        if self.is_development() { Level::Debug } else { Level::Info }
    }

    /// Lowest level that gets a captured stack trace.
    pub const fn stacktrace_level(self) -> Level {
        if self.is_development() { Level::Warn } else { Level::Error }
    }

    /// Human-readable (console) encoding is only allowed here.
    pub const fn allows_console_encoding(self) -> bool {
        matches!(self, RunMode::Debug | RunMode::Dev)
    }

    /// Dev and test runs never accumulate log files on disk.
    pub const fn discards_file_output(self) -> bool {
        matches!(self, RunMode::Dev | RunMode::Test)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(RunMode::Debug),
            "DEV" => Ok(RunMode::Dev),
            "TEST" => Ok(RunMode::Test),
            "PRE" | "PRE-PROD" | "PREPROD" => Ok(RunMode::Pre),
            "PROD" => Ok(RunMode::Prod),
            "RELEASE" => Ok(RunMode::Release),
            _ => Err(ConfigError::InvalidRunMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for RunMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RunMode> for String {
    fn from(mode: RunMode) -> Self {
        mode.as_str().to_ascii_lowercase()
    }
}
