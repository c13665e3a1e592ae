use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Encoded field key carrying the alert priority.
pub const ALERT_PRIORITY_FIELD: &str = "x_error_priority";

/// Escalation hint for the remote alerting backend.
///
/// `First` pages a developer's phone, `Second` goes to chat, `Third` is
/// best-effort. Error records without an explicit priority get `Third`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlertPriority {
    First,
    Second,
    #[default]
    Third,
}

impl AlertPriority {
    pub const fn as_str(self) -> &'static str {
        match self {
            AlertPriority::First => "Alert0",
            AlertPriority::Second => "Alert2",
            AlertPriority::Third => "Alert3",
        }
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alert0" | "first" | "1" => Ok(AlertPriority::First),
            "alert2" | "second" | "2" => Ok(AlertPriority::Second),
            "alert3" | "third" | "3" => Ok(AlertPriority::Third),
            other => Err(format!("unknown alert priority: {other}")),
        }
    }
}

impl Serialize for AlertPriority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AlertPriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
