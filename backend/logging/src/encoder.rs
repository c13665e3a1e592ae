//! Record encoders. One record per line.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracelog_config::Encoding;
use tracelog_core::{ALERT_PRIORITY_FIELD, LogError, LogRecord, REQUEST_ID_FIELD};

/// Timestamp layout shared by both encodings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %Z";

pub trait Encoder: Send + Sync {
    /// Append one encoded line (including the trailing newline) to `buf`.
    fn encode(&self, record: &LogRecord, buf: &mut Vec<u8>) -> Result<(), LogError>;
}

pub fn encoder_for(encoding: Encoding) -> Arc<dyn Encoder> {
    match encoding {
        Encoding::Json => Arc::new(JsonEncoder),
        Encoding::Console => Arc::new(ConsoleEncoder),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Machine-parseable encoding with a stable key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

struct ObjectWriter<'a> {
    buf: &'a mut Vec<u8>,
    first: bool,
}

impl<'a> ObjectWriter<'a> {
    fn open(buf: &'a mut Vec<u8>) -> Self {
        buf.push(b'{');
        Self { buf, first: true }
    }

    fn entry<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<(), LogError> {
        if !self.first {
            self.buf.push(b',');
        }
        self.first = false;
        serde_json::to_writer(&mut *self.buf, key)?;
        self.buf.push(b':');
        serde_json::to_writer(&mut *self.buf, value)?;
        Ok(())
    }

    fn close(self) {
        self.buf.push(b'}');
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &LogRecord, buf: &mut Vec<u8>) -> Result<(), LogError> {
        let mut obj = ObjectWriter::open(buf);
        obj.entry("ts", &record.timestamp.format(TIMESTAMP_FORMAT).to_string())?;
        obj.entry("level", record.level.as_str())?;
        obj.entry("logger", &*record.logger)?;
        obj.entry("component", &*record.logger)?;
        if let Some(caller) = &record.caller {
            obj.entry("caller", &caller.short())?;
        }
        obj.entry("msg", &record.message)?;
        for field in &record.fields {
            obj.entry(&field.key, &field.value)?;
        }
        if let Some(request_id) = &record.request_id {
            obj.entry(REQUEST_ID_FIELD, request_id)?;
        }
        if let Some(priority) = &record.alert_priority {
            obj.entry(ALERT_PRIORITY_FIELD, priority)?;
        }
        if let Some(stacktrace) = &record.stacktrace {
            obj.entry("stacktrace", stacktrace)?;
        }
        obj.close();
        buf.push(b'\n');
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Tab-separated human-readable encoding for debug/dev run-modes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEncoder;

impl Encoder for ConsoleEncoder {
    fn encode(&self, record: &LogRecord, buf: &mut Vec<u8>) -> Result<(), LogError> {
        let caller = record.caller.map(|c| c.short()).unwrap_or_default();
        write!(
            buf,
            "{}\t{}\t{}\t{}\t{}",
            record.timestamp.format(TIMESTAMP_FORMAT),
            record.level.as_str().to_ascii_uppercase(),
            record.logger,
            caller,
            record.message,
        )
        .map_err(|e| LogError::Sink { sink: "console-encoder".into(), message: e.to_string() })?;

        let has_extras = !record.fields.is_empty()
            || record.request_id.is_some()
            || record.alert_priority.is_some();
        if has_extras {
            buf.push(b'\t');
            let mut obj = ObjectWriter::open(buf);
            for field in &record.fields {
                obj.entry(&field.key, &field.value)?;
            }
            if let Some(request_id) = &record.request_id {
                obj.entry(REQUEST_ID_FIELD, request_id)?;
            }
            if let Some(priority) = &record.alert_priority {
                obj.entry(ALERT_PRIORITY_FIELD, priority)?;
            }
            obj.close();
        }
        buf.push(b'\n');
        if let Some(stacktrace) = &record.stacktrace {
            buf.extend_from_slice(stacktrace.as_bytes());
            if !stacktrace.ends_with('\n') {
                buf.push(b'\n');
            }
        }
        Ok(())
    }
}
