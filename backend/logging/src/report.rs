//! Self-reporting of the runtime's own failures.

use tracelog_core::{Field, FieldValue};

/// Receives WARN-level reports about failures inside the runtime
/// (rotation, alert delivery, sink writes).
///
/// Implementations must not forward reports to the alert channel.
pub trait Reporter: Send + Sync {
    fn report(&self, message: &str, fields: Vec<Field>);
}

/// Reports through `tracing` when no logger is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, message: &str, fields: Vec<Field>) {
        tracing::warn!(fields = %render_fields(&fields), "{message}");
    }
}

/// `k=v k=v` rendering used for last-resort diagnostics.
pub(crate) fn render_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| match &f.value {
            FieldValue::Str(s) => format!("{}={s}", f.key),
            other => format!("{}={}", f.key, other.to_json()),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
