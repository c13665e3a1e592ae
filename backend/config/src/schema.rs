//! Output configuration schema.
//!
//! Typed for serde TOML/YAML/JSON deserialization with camelCase keys.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracelog_core::Level;

use crate::defaults::{
    DEFAULT_ALERT_MAX_IN_FLIGHT, DEFAULT_ALERT_QUEUE_CAPACITY, DEFAULT_ALERT_TIMEOUT_MS,
    DEFAULT_LOG_DIR, DEFAULT_MAX_FILE_BYTES, DEFAULT_SAMPLING_INITIAL, DEFAULT_SAMPLING_THEREAFTER,
};
use crate::policy::SeverityPolicy;
use crate::run_mode::RunMode;
use crate::sink::SinkAddress;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Record encoding. `Console` is only valid in debug/dev run-modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Json,
    Console,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Json => f.write_str("json"),
            Encoding::Console => f.write_str("console"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output kinds bitmask
// ---------------------------------------------------------------------------

/// Which built-in sinks are active. `FILE | STDOUT` enables both.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OutputKinds(u8);

impl OutputKinds {
    pub const NONE: OutputKinds = OutputKinds(0);
    pub const FILE: OutputKinds = OutputKinds(1);
    pub const STDOUT: OutputKinds = OutputKinds(2);

    const ALL_BITS: u8 = 0b11;

    /// Unknown bits are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        OutputKinds(bits & Self::ALL_BITS)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: OutputKinds) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::FILE) {
            names.push("file");
        }
        if self.contains(Self::STDOUT) {
            names.push("stdout");
        }
        names
    }
}

impl BitOr for OutputKinds {
    type Output = OutputKinds;

    fn bitor(self, rhs: Self) -> Self::Output {
        OutputKinds(self.0 | rhs.0)
    }
}

impl BitOrAssign for OutputKinds {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for OutputKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        f.write_str(&self.names().join(" | ").to_ascii_uppercase())
    }
}

impl Serialize for OutputKinds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OutputKinds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bits(u8),
            Names(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bits(bits) => Ok(OutputKinds::from_bits(bits)),
            Repr::Names(names) => names.iter().try_fold(OutputKinds::NONE, |acc, name| {
                match name.to_ascii_lowercase().as_str() {
                    "file" => Ok(acc | OutputKinds::FILE),
                    "stdout" => Ok(acc | OutputKinds::STDOUT),
                    other => Err(serde::de::Error::custom(format!("unknown output kind: {other}"))),
                }
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Sampling / rotation / alerting
// ---------------------------------------------------------------------------

/// Per-second sampling of repeated (level, message) records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    pub initial: u64,
    pub thereafter: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            initial: DEFAULT_SAMPLING_INITIAL,
            thereafter: DEFAULT_SAMPLING_THEREAFTER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RotationConfig {
    /// Early rotation happens before a write would push the file past this.
    pub max_file_bytes: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Remote alerting endpoint and the bounds on forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfig {
    /// `host:port` or a full URL.
    pub endpoint: String,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl AlertConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            queue_capacity: DEFAULT_ALERT_QUEUE_CAPACITY,
            max_in_flight: DEFAULT_ALERT_MAX_IN_FLIGHT,
            timeout_ms: DEFAULT_ALERT_TIMEOUT_MS,
        }
    }
}

fn default_queue_capacity() -> usize {
    DEFAULT_ALERT_QUEUE_CAPACITY
}

fn default_max_in_flight() -> usize {
    DEFAULT_ALERT_MAX_IN_FLIGHT
}

fn default_timeout_ms() -> u64 {
    DEFAULT_ALERT_TIMEOUT_MS
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything needed to build a logger instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfiguration {
    /// Component (service) name, encoded as `logger` and `component`.
    pub component: String,

    #[serde(default)]
    pub disable_stacktrace: bool,

    pub run_mode: RunMode,

    #[serde(default)]
    pub encoding: Encoding,

    #[serde(default = "default_outputs")]
    pub outputs: OutputKinds,

    /// Log file path; `logs/<hostname>.log` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Additional scheme-qualified destinations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sinks: Vec<SinkAddress>,

    /// `None` disables sampling.
    #[serde(default = "default_sampling")]
    pub sampling: Option<SamplingConfig>,

    #[serde(default)]
    pub rotation: RotationConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertConfig>,

    #[serde(default)]
    pub severity_policy: SeverityPolicy,

    /// Initial threshold; the run-mode default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

fn default_outputs() -> OutputKinds {
    OutputKinds::STDOUT
}

fn default_sampling() -> Option<SamplingConfig> {
    Some(SamplingConfig::default())
}

impl OutputConfiguration {
    pub fn new(component: impl Into<String>, run_mode: RunMode) -> Self {
        Self {
            component: component.into(),
            disable_stacktrace: false,
            run_mode,
            encoding: Encoding::default(),
            outputs: default_outputs(),
            file_path: None,
            sinks: Vec::new(),
            sampling: default_sampling(),
            rotation: RotationConfig::default(),
            alert: None,
            severity_policy: SeverityPolicy::default(),
            level: None,
        }
    }

    pub fn with_outputs(mut self, outputs: OutputKinds) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_sink(mut self, address: SinkAddress) -> Self {
        self.sinks.push(address);
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_sampling(mut self, sampling: Option<SamplingConfig>) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.rotation.max_file_bytes = max_file_bytes;
        self
    }

    pub fn with_alert(mut self, alert: AlertConfig) -> Self {
        self.alert = Some(alert);
        self
    }

    pub fn with_severity_policy(mut self, policy: SeverityPolicy) -> Self {
        self.severity_policy = policy;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn without_stacktrace(mut self) -> Self {
        self.disable_stacktrace = true;
        self
    }

    pub fn initial_level(&self) -> Level {
        self.level.unwrap_or_else(|| self.run_mode.default_level())
    }

    /// Lowest level that captures a stack trace, `None` when disabled.
    pub fn stacktrace_level(&self) -> Option<Level> {
        (!self.disable_stacktrace).then(|| self.run_mode.stacktrace_level())
    }

    /// Configured file path, else `logs/<hostname>.log`. The component
    /// name stands in only when the OS host name cannot be read.
    pub fn resolved_file_path(&self) -> PathBuf {
        self.file_path.clone().unwrap_or_else(|| {
            let host = host_name().unwrap_or_else(|| self.component.clone());
            PathBuf::from(DEFAULT_LOG_DIR).join(format!("{host}.log"))
        })
    }

    /// Where file output goes for this configuration. Pure in the run-mode:
    /// dev and test always map to `discard`.
    pub fn file_destination(&self) -> SinkAddress {
        if self.run_mode.discards_file_output() {
            SinkAddress::Discard
        } else {
            SinkAddress::RotatingFile(self.resolved_file_path())
        }
    }

    /// Full destination list: file, then stdout, then extra sinks.
    pub fn sink_addresses(&self) -> Vec<SinkAddress> {
        let mut addresses = Vec::with_capacity(2 + self.sinks.len());
        if self.outputs.contains(OutputKinds::FILE) {
            addresses.push(self.file_destination());
        }
        if self.outputs.contains(OutputKinds::STDOUT) {
            addresses.push(SinkAddress::Stdout);
        }
        addresses.extend(self.sinks.iter().cloned());
        addresses
    }
}

/// Host name as reported by the OS, `None` when empty or not UTF-8.
pub fn host_name() -> Option<String> {
    gethostname::gethostname()
        .into_string()
        .ok()
        .filter(|h| !h.trim().is_empty())
}
