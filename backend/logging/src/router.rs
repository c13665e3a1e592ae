//! Synchronous fan-out of one record to every configured sink.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracelog_core::{LogError, LogRecord};

use crate::encoder::Encoder;
use crate::sink::{Sink, rotation_error};

/// One sink's failure during dispatch or flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
    pub sink: String,
    pub error: String,
    /// The write landed but a size-triggered rotation failed.
    pub rotation: bool,
}

impl From<SinkFailure> for LogError {
    fn from(failure: SinkFailure) -> Self {
        LogError::Sink {
            sink: failure.sink,
            message: failure.error,
        }
    }
}

/// Fixed set of destinations. Sinks are visited in order and each one is
/// isolated: an error or panic in one never stops the others.
pub struct SinkRouter {
    sinks: Vec<Arc<dyn Sink>>,
    encoder: Arc<dyn Encoder>,
}

impl SinkRouter {
    pub fn new(sinks: Vec<Arc<dyn Sink>>, encoder: Arc<dyn Encoder>) -> Self {
        Self { sinks, encoder }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Encode once and write to every sink. Returns the failures.
    pub fn dispatch(&self, record: &LogRecord) -> Vec<SinkFailure> {
        let mut line = Vec::with_capacity(256);
        if let Err(e) = self.encoder.encode(record, &mut line) {
            return vec![SinkFailure {
                sink: "encoder".into(),
                error: e.to_string(),
                rotation: false,
            }];
        }
        self.each_sink(|sink| sink.write(&line))
    }

    pub fn flush_all(&self) -> Vec<SinkFailure> {
        self.each_sink(|sink| sink.flush())
    }

    fn each_sink(&self, op: impl Fn(&dyn Sink) -> std::io::Result<()>) -> Vec<SinkFailure> {
        let mut failures = Vec::new();
        for sink in &self.sinks {
            let (error, rotation) = match catch_unwind(AssertUnwindSafe(|| op(sink.as_ref()))) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => match rotation_error(&e) {
                    Some(rotation) => (rotation.to_string(), true),
                    None => (e.to_string(), false),
                },
                Err(panic) => (format!("sink panicked: {}", panic_message(panic.as_ref())), false),
            };
            failures.push(SinkFailure {
                sink: sink.name().to_string(),
                error,
                rotation,
            });
        }
        failures
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
