//! Scheme-qualified sink addresses.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ROTATING_FILE_SCHEME: &str = "rotating-file://";

/// A destination string resolved once, when the router is built.
///
/// Accepted forms: `stdout`, `stderr`, `discard`, `rotating-file://<path>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SinkAddress {
    Stdout,
    Stderr,
    Discard,
    RotatingFile(PathBuf),
}

impl SinkAddress {
    /// Sink name used in failure reports.
    pub fn name(&self) -> &'static str {
        match self {
            SinkAddress::Stdout => "stdout",
            SinkAddress::Stderr => "stderr",
            SinkAddress::Discard => "discard",
            SinkAddress::RotatingFile(_) => "rotating-file",
        }
    }
}

impl fmt::Display for SinkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkAddress::RotatingFile(path) => write!(f, "{ROTATING_FILE_SCHEME}{}", path.display()),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for SinkAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "stdout" => return Ok(SinkAddress::Stdout),
            "stderr" => return Ok(SinkAddress::Stderr),
            "discard" => return Ok(SinkAddress::Discard),
            _ => {}
        }
        match trimmed.strip_prefix(ROTATING_FILE_SCHEME) {
            Some(path) if !path.is_empty() => Ok(SinkAddress::RotatingFile(PathBuf::from(path))),
            _ => Err(ConfigError::UnknownSink(s.to_string())),
        }
    }
}

impl TryFrom<String> for SinkAddress {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SinkAddress> for String {
    fn from(address: SinkAddress) -> Self {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_schemes() {
        assert_eq!("stdout".parse::<SinkAddress>().unwrap(), SinkAddress::Stdout);
        assert_eq!("discard".parse::<SinkAddress>().unwrap(), SinkAddress::Discard);
        assert_eq!(
            "rotating-file://logs/app.log".parse::<SinkAddress>().unwrap(),
            SinkAddress::RotatingFile(PathBuf::from("logs/app.log"))
        );
    }

    #[test]
    fn rejects_unknown_scheme_and_empty_path() {
        assert!(matches!("kafka://topic".parse::<SinkAddress>(), Err(ConfigError::UnknownSink(_))));
        assert!("rotating-file://".parse::<SinkAddress>().is_err());
    }

    #[test]
    fn display_roundtrips() {
        let address = SinkAddress::RotatingFile(PathBuf::from("/var/log/x.log"));
        assert_eq!(address.to_string().parse::<SinkAddress>().unwrap(), address);
    }
}
