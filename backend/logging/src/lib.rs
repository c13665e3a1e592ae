//! `tracelog`: structured logging runtime.
//!
//! Provides:
//! - [`Logger`]: leveled entry points with request correlation and alert priority
//! - [`SinkRouter`]: isolated fan-out to stdout, rotating files and custom sinks
//! - [`RotatingFileSink`] + [`RotationScheduler`]: hour-aligned and size-capped rotation
//! - [`AlertTransport`]: bounded, best-effort forwarding of error records
//! - [`TracelogLayer`]: bridge from `tracing` events
//!
//! ```no_run
//! use tracelog::{Logger, TraceContext, fields};
//! use tracelog::config::{OutputConfiguration, RunMode};
//!
//! let logger = Logger::new(&OutputConfiguration::new("risk", RunMode::Test)).unwrap();
//! logger.info(&TraceContext::background(), "info test", fields!["int" => 100]);
//! ```

pub mod alert;
pub mod encoder;
pub mod global;
pub mod layer;
pub mod level;
pub mod logger;
pub mod pipeline;
pub mod report;
pub mod rotation;
pub mod router;
pub mod sampler;
pub mod sink;

pub use tracelog_config as config;
pub use tracelog_core::{
    ALERT_PRIORITY_FIELD, AlertPriority, CallerLocation, Field, FieldValue, Level, LogError, LogRecord,
    REQUEST_ID_FIELD, REQUEST_ID_HEADER, TraceContext,
};

pub use alert::{AlertBackend, AlertEvent, AlertStats, AlertTransport, HttpAlertBackend};
pub use encoder::{ConsoleEncoder, Encoder, JsonEncoder};
pub use layer::TracelogLayer;
pub use level::LevelController;
pub use logger::{Logger, LoggerBuilder};
pub use pipeline::FieldPipeline;
pub use report::{Reporter, TracingReporter};
pub use rotation::{Clock, ROTATION_PERIOD, RotationScheduler, SystemClock, first_rotation_delay};
pub use router::{SinkFailure, SinkRouter};
pub use sampler::Sampler;
pub use sink::{ConsoleSink, DiscardSink, MemorySink, Rotate, RotatingFileSink, Sink};

/// Build a `Vec<Field>` from `key => value` pairs.
///
/// ```
/// let fields = tracelog::fields!["int" => 100, "user" => "u1"];
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        ::std::vec::Vec::<$crate::Field>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Field::new($key, $value)),+]
    };
}
