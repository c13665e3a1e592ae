//! The logging facade.
//!
//! A [`Logger`] is an explicitly constructed instance that owns its level
//! threshold, sink router, rotation scheduler and alert transport. Clones
//! share the same instance.
//!
//! Per-call flow: threshold check, sampling, enrichment, synchronous
//! fan-out to sinks, then the severity policy (forward to alerting, abort).

use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tracelog_config::{OutputConfiguration, SeverityPolicy, validate};
use tracelog_core::{AlertPriority, CallerLocation, Field, Level, LogError, TraceContext};
use tracing::{debug, warn};

use crate::alert::{AlertBackend, AlertStats, AlertTransport, HttpAlertBackend};
use crate::encoder::encoder_for;
use crate::level::LevelController;
use crate::pipeline::FieldPipeline;
use crate::report::{Reporter, render_fields};
use crate::rotation::{Clock, RotationScheduler, SystemClock};
use crate::router::{SinkFailure, SinkRouter};
use crate::sampler::Sampler;
use crate::sink::{self, Rotate, RotatingFiles, Sink};

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    level: LevelController,
    pipeline: FieldPipeline,
    sampler: Option<Sampler>,
    router: SinkRouter,
    alerts: Option<AlertTransport>,
    policy: SeverityPolicy,
    rotating: Arc<RotatingFiles>,
    scheduler: RotationScheduler,
    closed: AtomicBool,
}

impl Logger {
    /// Build a logger from a validated configuration.
    pub fn new(config: &OutputConfiguration) -> Result<Self, LogError> {
        Self::builder(config.clone()).build()
    }

    pub fn builder(config: OutputConfiguration) -> LoggerBuilder {
        LoggerBuilder::new(config)
    }

    pub fn component(&self) -> &str {
        self.inner.pipeline.component()
    }

    #[track_caller]
    pub fn debug(&self, ctx: &TraceContext, msg: &str, fields: Vec<Field>) {
        self.inner.log(Level::Debug, ctx, msg, fields, None, caller());
    }

    #[track_caller]
    pub fn info(&self, ctx: &TraceContext, msg: &str, fields: Vec<Field>) {
        self.inner.log(Level::Info, ctx, msg, fields, None, caller());
    }

    #[track_caller]
    pub fn warn(&self, ctx: &TraceContext, msg: &str, fields: Vec<Field>) {
        self.inner.log(Level::Warn, ctx, msg, fields, None, caller());
    }

    /// Error with the default (least aggressive) alert priority.
    #[track_caller]
    pub fn error(&self, ctx: &TraceContext, msg: &str, fields: Vec<Field>) {
        self.inner.log(Level::Error, ctx, msg, fields, None, caller());
    }

    #[track_caller]
    pub fn error_with_priority(
        &self,
        ctx: &TraceContext,
        priority: AlertPriority,
        msg: &str,
        fields: Vec<Field>,
    ) {
        self.inner.log(Level::Error, ctx, msg, fields, Some(priority), caller());
    }

    /// Critical records abort the process after being recorded under the
    /// default severity policy.
    #[track_caller]
    pub fn critical(&self, ctx: &TraceContext, msg: &str, fields: Vec<Field>) {
        self.inner.log(Level::Critical, ctx, msg, fields, None, caller());
    }

    #[track_caller]
    pub fn log(&self, level: Level, ctx: &TraceContext, msg: &str, fields: Vec<Field>) {
        self.inner.log(level, ctx, msg, fields, None, caller());
    }

    /// Entry point for bridges that already know the call site.
    pub(crate) fn log_at(
        &self,
        level: Level,
        ctx: &TraceContext,
        msg: &str,
        fields: Vec<Field>,
        priority: Option<AlertPriority>,
        caller: Option<CallerLocation>,
    ) {
        self.inner.log(level, ctx, msg, fields, priority, caller);
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.inner.level.is_enabled(level)
    }

    pub fn level(&self) -> Level {
        self.inner.level.current()
    }

    /// Returns `true` when the threshold changed.
    pub fn set_level(&self, level: Level) -> bool {
        let changed = self.inner.level.set(level);
        if changed {
            debug!(level = %level, component = %self.component(), "Log level changed");
        }
        changed
    }

    /// Parse and apply a level name. Unknown names fall back to INFO and
    /// are reported.
    pub fn set_level_str(&self, raw: &str) -> Level {
        let level = match raw.parse::<Level>() {
            Ok(level) => level,
            Err(_) => {
                self.inner.report("unknown log level, using info", vec![Field::str("level_string", raw)]);
                Level::Info
            }
        };
        self.set_level(level);
        level
    }

    /// Rotate every file sink now. Serializes with the scheduler and with
    /// writes through each sink's lock.
    pub fn rotate(&self) -> Result<(), LogError> {
        self.inner.rotating.rotate()
    }

    pub fn flush(&self) -> Result<(), LogError> {
        match self.inner.router.flush_all().into_iter().next() {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }

    /// Flush sinks, stop the scheduler and close the alert queue. Later log
    /// calls are ignored. Safe to call any number of times.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    /// [`Logger::shutdown`], then wait up to `grace` for queued alerts.
    pub async fn shutdown_and_drain(&self, grace: Duration) -> bool {
        self.inner.shutdown();
        match &self.inner.alerts {
            Some(alerts) => alerts.drain(grace).await,
            None => true,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn alert_stats(&self) -> Option<AlertStats> {
        self.inner.alerts.as_ref().map(AlertTransport::stats)
    }

    pub fn rotation_scheduled(&self) -> bool {
        self.inner.scheduler.is_started()
    }
}

#[track_caller]
fn caller() -> Option<CallerLocation> {
    Some(CallerLocation::from_location(Location::caller()))
}

impl Inner {
    fn log(
        &self,
        level: Level,
        ctx: &TraceContext,
        msg: &str,
        fields: Vec<Field>,
        priority: Option<AlertPriority>,
        caller: Option<CallerLocation>,
    ) {
        if self.closed.load(Ordering::Acquire) || !self.level.is_enabled(level) {
            return;
        }
        if let Some(sampler) = &self.sampler {
            if !sampler.sample(level, msg) {
                return;
            }
        }

        let record = self.pipeline.enrich(level, ctx, msg, fields, priority, caller);
        for failure in self.router.dispatch(&record) {
            self.report_sink_failure(&failure);
        }

        let action = self.policy.action_for(level);
        if action.forwards() && level.is_error_severity() {
            if let Some(alerts) = &self.alerts {
                alerts.forward(&record);
            }
        }
        if action.aborts() {
            let _ = self.router.flush_all();
            panic!("{}", record.message);
        }
    }

    /// WARN-level self-report. Honours the threshold but skips sampling,
    /// is never forwarded, and its own sink failures go to `tracing`.
    fn report(&self, message: &str, fields: Vec<Field>) {
        if self.closed.load(Ordering::Acquire) || !self.level.is_enabled(Level::Warn) {
            return;
        }
        let record = self
            .pipeline
            .enrich(Level::Warn, &TraceContext::background(), message, fields, None, None);
        for failure in self.router.dispatch(&record) {
            warn!(
                sink = %failure.sink,
                error = %failure.error,
                report = %message,
                "Log sink failed while writing internal report"
            );
        }
    }

    fn report_sink_failure(&self, failure: &SinkFailure) {
        let message = if failure.rotation { "log rotate error" } else { "log sink write failed" };
        self.report(
            message,
            vec![Field::str("sink", failure.sink.clone()), Field::str("error", failure.error.clone())],
        );
    }

    fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.scheduler.stop();
        if let Some(alerts) = &self.alerts {
            alerts.close();
        }
        for failure in self.router.flush_all() {
            warn!(sink = %failure.sink, error = %failure.error, "Log sink flush failed during shutdown");
        }
        debug!(component = %self.pipeline.component(), "Logger shut down");
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.scheduler.stop();
        let _ = self.router.flush_all();
    }
}

/// Routes runtime self-reports back through the owning logger without
/// keeping it alive.
struct SelfReporter(Weak<Inner>);

impl Reporter for SelfReporter {
    fn report(&self, message: &str, fields: Vec<Field>) {
        match self.0.upgrade() {
            Some(inner) => inner.report(message, fields),
            None => warn!(fields = %render_fields(&fields), "{message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct LoggerBuilder {
    config: OutputConfiguration,
    extra_sinks: Vec<Arc<dyn Sink>>,
    clock: Arc<dyn Clock>,
    alert_backend: Option<Arc<dyn AlertBackend>>,
}

impl LoggerBuilder {
    pub fn new(config: OutputConfiguration) -> Self {
        Self {
            config,
            extra_sinks: Vec::new(),
            clock: Arc::new(SystemClock),
            alert_backend: None,
        }
    }

    /// Add a sink after the configured ones.
    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    /// Clock used to align the rotation schedule.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `backend` instead of HTTP delivery to `alert.endpoint`.
    pub fn with_alert_backend(mut self, backend: Arc<dyn AlertBackend>) -> Self {
        self.alert_backend = Some(backend);
        self
    }

    /// Validate, open sinks and start background tasks.
    ///
    /// A tokio runtime is required only when a rotating file sink or an
    /// alert endpoint is configured.
    pub fn build(self) -> Result<Logger, LogError> {
        let LoggerBuilder {
            config,
            extra_sinks,
            clock,
            alert_backend,
        } = self;
        validate(&config)?;

        let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
        let mut rotating = Vec::new();
        for address in config.sink_addresses() {
            let resolved = sink::resolve(&address, config.rotation.max_file_bytes)?;
            sinks.push(resolved.sink);
            rotating.extend(resolved.rotating);
        }
        sinks.extend(extra_sinks);
        let rotating = Arc::new(RotatingFiles::new(rotating));

        let runtime = if !rotating.is_empty() || config.alert.is_some() {
            let what = if rotating.is_empty() { "alert forwarding" } else { "log file rotation" };
            Some(Handle::try_current().map_err(|_| LogError::RuntimeUnavailable(what))?)
        } else {
            None
        };

        let alert_backend = match (&config.alert, alert_backend) {
            (Some(_), Some(backend)) => Some(backend),
            (Some(alert), None) => Some(Arc::new(HttpAlertBackend::new(
                &alert.endpoint,
                Duration::from_millis(alert.timeout_ms),
            )?) as Arc<dyn AlertBackend>),
            (None, _) => None,
        };

        let router = SinkRouter::new(sinks, encoder_for(config.encoding));
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let alerts = match (&runtime, &config.alert, alert_backend) {
                (Some(runtime), Some(alert), Some(backend)) => Some(AlertTransport::start(
                    runtime,
                    alert,
                    backend,
                    Arc::new(SelfReporter(weak.clone())),
                )),
                _ => None,
            };
            Inner {
                level: LevelController::new(config.initial_level()),
                pipeline: FieldPipeline::new(config.component.as_str(), config.stacktrace_level()),
                sampler: config.sampling.map(Sampler::new),
                router,
                alerts,
                policy: config.severity_policy,
                rotating: rotating.clone(),
                scheduler: RotationScheduler::new(),
                closed: AtomicBool::new(false),
            }
        });

        if !rotating.is_empty() {
            inner.scheduler.start(
                rotating as Arc<dyn Rotate>,
                clock,
                Arc::new(SelfReporter(Arc::downgrade(&inner))),
            )?;
        }

        debug!(
            component = %config.component,
            run_mode = %config.run_mode,
            level = %inner.level.current(),
            sinks = ?inner.router.sink_names(),
            "Logger initialized"
        );
        Ok(Logger { inner })
    }
}
