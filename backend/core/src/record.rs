use std::panic::Location;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::field::Field;
use crate::level::Level;
use crate::priority::AlertPriority;

/// Source location of the log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerLocation {
    pub file: &'static str,
    pub line: u32,
}

impl CallerLocation {
    pub fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    pub fn from_location(location: &Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// `dir/file.rs:line`, keeping only the last two path components.
    pub fn short(&self) -> String {
        let normalized = self.file.replace('\\', "/");
        let mut parts = normalized.rsplitn(3, '/');
        let file = parts.next().unwrap_or_default();
        match parts.next() {
            Some(dir) => format!("{dir}/{file}:{}", self.line),
            None => format!("{file}:{}", self.line),
        }
    }
}

/// A fully enriched record. Sinks only read and serialize it.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub message: String,
    pub fields: Vec<Field>,
    pub logger: Arc<str>,
    pub request_id: Option<String>,
    pub alert_priority: Option<AlertPriority>,
    pub caller: Option<CallerLocation>,
    pub stacktrace: Option<String>,
}

impl LogRecord {
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}
