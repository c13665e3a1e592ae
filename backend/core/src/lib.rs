//! Core data model for the tracelog runtime.
//!
//! Levels, alert priorities, trace context, typed fields and the immutable
//! [`LogRecord`] that flows from the facade to every sink.

pub mod context;
pub mod error;
pub mod field;
pub mod level;
pub mod priority;
pub mod record;

pub use context::{REQUEST_ID_FIELD, REQUEST_ID_HEADER, TraceContext};
pub use error::LogError;
pub use field::{Field, FieldValue};
pub use level::{Level, ParseLevelError};
pub use priority::{ALERT_PRIORITY_FIELD, AlertPriority};
pub use record::{CallerLocation, LogRecord};
