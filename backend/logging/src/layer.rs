//! Bridge from the `tracing` ecosystem.
//!
//! [`TracelogLayer`] turns each `tracing` event into a record on the owning
//! [`Logger`]. A `request_id` (or `x_request_id`) field on the event or any
//! enclosing span becomes the correlation id; an `alert_priority` field sets
//! the alert priority of error events.

use std::fmt;

use tracing::field::{Field as TracingField, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracelog_core::{AlertPriority, CallerLocation, Field, Level, TraceContext};

use crate::logger::Logger;

/// Crates whose diagnostics never loop back into the logger.
const OWN_CRATES: [&str; 4] = ["tracelog", "tracelog_core", "tracelog_config", "tracelog_http"];

fn is_own_target(target: &str) -> bool {
    let krate = target.split("::").next().unwrap_or(target);
    OWN_CRATES.contains(&krate)
}

pub struct TracelogLayer {
    logger: Logger,
}

impl TracelogLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl Logger {
    pub fn layer(&self) -> TracelogLayer {
        TracelogLayer::new(self.clone())
    }
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::ERROR => Level::Error,
    }
}

/// Correlation id stored in span extensions.
struct SpanRequestId(String);

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<Field>,
    request_id: Option<String>,
    priority: Option<AlertPriority>,
}

impl EventVisitor {
    fn special_str(&mut self, field: &TracingField, value: &str) -> bool {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "request_id" | "x_request_id" => self.request_id = Some(value.to_string()),
            "alert_priority" => match value.parse() {
                Ok(priority) => self.priority = Some(priority),
                Err(_) => return false,
            },
            _ => return false,
        }
        true
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if !self.special_str(field, value) {
            self.fields.push(Field::str(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.fields.push(Field::new(field.name(), value));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.fields.push(Field::str(field.name(), value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        if !self.special_str(field, &rendered) {
            self.fields.push(Field::str(field.name(), rendered));
        }
    }
}

#[derive(Default)]
struct SpanVisitor(Option<String>);

impl Visit for SpanVisitor {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if matches!(field.name(), "request_id" | "x_request_id") {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if matches!(field.name(), "request_id" | "x_request_id") {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S> Layer<S> for TracelogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = SpanVisitor::default();
        attrs.record(&mut visitor);
        if let (Some(request_id), Some(span)) = (visitor.0, ctx.span(id)) {
            span.extensions_mut().insert(SpanRequestId(request_id));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }
        let level = map_level(metadata.level());
        if !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let request_id = visitor.request_id.or_else(|| {
            ctx.event_scope(event)?
                .find_map(|span| {
                    let extensions = span.extensions();
                    extensions.get::<SpanRequestId>().map(|r| r.0.clone())
                })
        });
        let trace = match request_id {
            Some(id) => TraceContext::with_request_id(id),
            None => TraceContext::background(),
        };
        let caller = metadata
            .file()
            .zip(metadata.line())
            .map(|(file, line)| CallerLocation::new(file, line));

        self.logger.log_at(
            level,
            &trace,
            visitor.message.as_deref().unwrap_or_default(),
            visitor.fields,
            visitor.priority,
            caller,
        );
    }
}
