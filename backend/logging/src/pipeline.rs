//! Turns a call into an immutable [`LogRecord`].

use std::backtrace::Backtrace;
use std::sync::Arc;

use chrono::Local;
use tracelog_core::{AlertPriority, CallerLocation, Field, Level, LogRecord, TraceContext};

/// Shapes records. Performs no I/O and cannot fail.
#[derive(Debug, Clone)]
pub struct FieldPipeline {
    component: Arc<str>,
    stacktrace_from: Option<Level>,
}

impl FieldPipeline {
    pub fn new(component: impl Into<Arc<str>>, stacktrace_from: Option<Level>) -> Self {
        Self {
            component: component.into(),
            stacktrace_from,
        }
    }

    pub fn component(&self) -> &Arc<str> {
        &self.component
    }

    /// Build the record for one log call.
    ///
    /// `priority` is only kept for error severity; there it defaults to
    /// [`AlertPriority::Third`].
    pub fn enrich(
        &self,
        level: Level,
        ctx: &TraceContext,
        message: impl Into<String>,
        fields: Vec<Field>,
        priority: Option<AlertPriority>,
        caller: Option<CallerLocation>,
    ) -> LogRecord {
        let alert_priority = level
            .is_error_severity()
            .then(|| priority.unwrap_or_default());
        let stacktrace = self
            .stacktrace_from
            .filter(|from| level >= *from)
            .map(|_| Backtrace::force_capture().to_string());

        LogRecord {
            timestamp: Local::now(),
            level,
            message: message.into(),
            fields,
            logger: Arc::clone(&self.component),
            request_id: ctx.request_id().map(str::to_owned),
            alert_priority,
            caller,
            stacktrace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> FieldPipeline {
        FieldPipeline::new("risk", Some(Level::Error))
    }

    #[test]
    fn missing_request_id_is_not_an_error() {
        let rec = pipeline().enrich(Level::Info, &TraceContext::background(), "hi", vec![], None, None);
        assert_eq!(rec.request_id, None);
        assert_eq!(&*rec.logger, "risk");
    }

    #[test]
    fn copies_request_id_from_context() {
        let ctx = TraceContext::with_request_id("abc");
        let rec = pipeline().enrich(Level::Info, &ctx, "hi", vec![], None, None);
        assert_eq!(rec.request_id.as_deref(), Some("abc"));
    }

    #[test]
    fn error_defaults_to_third_priority() {
        let rec = pipeline().enrich(Level::Error, &TraceContext::background(), "boom", vec![], None, None);
        assert_eq!(rec.alert_priority, Some(AlertPriority::Third));
    }

    #[test]
    fn priority_dropped_below_error() {
        let rec = pipeline().enrich(
            Level::Warn,
            &TraceContext::background(),
            "meh",
            vec![],
            Some(AlertPriority::First),
            None,
        );
        assert_eq!(rec.alert_priority, None);
    }

    #[test]
    fn stacktrace_only_at_or_above_threshold() {
        let p = pipeline();
        let ctx = TraceContext::background();
        assert!(p.enrich(Level::Warn, &ctx, "w", vec![], None, None).stacktrace.is_none());
        assert!(p.enrich(Level::Error, &ctx, "e", vec![], None, None).stacktrace.is_some());

        let disabled = FieldPipeline::new("risk", None);
        assert!(disabled.enrich(Level::Critical, &ctx, "c", vec![], None, None).stacktrace.is_none());
    }

    #[test]
    fn preserves_field_order() {
        let fields = vec![Field::int("b", 2), Field::int("a", 1)];
        let rec = pipeline().enrich(Level::Info, &TraceContext::background(), "x", fields, None, None);
        let keys: Vec<_> = rec.fields.iter().map(|f| f.key.as_ref()).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
