//! Best-effort forwarding of error records to a remote alerting backend.
//!
//! `forward` never waits on the network. Events go into a bounded queue
//! drained by one dispatcher task, which runs at most `max_in_flight`
//! deliveries at a time. When the queue is full the newest event is
//! dropped. Delivery is at-most-once: failures are reported at WARN and
//! the event is discarded.

mod http;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracelog_config::AlertConfig;
use tracelog_core::{AlertPriority, Field, Level, LogError, LogRecord};
use tracing::debug;
use uuid::Uuid;

use crate::report::Reporter;

pub use http::HttpAlertBackend;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// The copy of a record handed to the alerting backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub logger: String,
    pub message: String,
    pub priority: AlertPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
}

impl AlertEvent {
    pub fn from_record(record: &LogRecord) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: record.timestamp.with_timezone(&Utc),
            level: record.level,
            logger: record.logger.to_string(),
            message: record.message.clone(),
            priority: record.alert_priority.unwrap_or_default(),
            request_id: record.request_id.clone(),
            fields: record
                .fields
                .iter()
                .map(|f| (f.key.to_string(), f.value.to_json()))
                .collect(),
            stacktrace: record.stacktrace.clone(),
        }
    }
}

/// The remote side. Implementations perform exactly one delivery attempt.
#[async_trait]
pub trait AlertBackend: Send + Sync {
    async fn send(&self, event: &AlertEvent) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertStats {
    pub enqueued: u64,
    pub delivered: u64,
    pub failed: u64,
    /// Rejected by `forward` because the queue was full or closed.
    pub dropped: u64,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

pub struct AlertTransport {
    tx: RwLock<Option<mpsc::Sender<AlertEvent>>>,
    counters: Arc<Counters>,
    saturated: AtomicBool,
    queue_capacity: usize,
    max_in_flight: usize,
    limit: Arc<Semaphore>,
    reporter: Arc<dyn Reporter>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl AlertTransport {
    /// Start on the current tokio runtime.
    pub fn try_start(
        config: &AlertConfig,
        backend: Arc<dyn AlertBackend>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, LogError> {
        let runtime =
            Handle::try_current().map_err(|_| LogError::RuntimeUnavailable("alert forwarding"))?;
        Ok(Self::start(&runtime, config, backend, reporter))
    }

    pub fn start(
        runtime: &Handle,
        config: &AlertConfig,
        backend: Arc<dyn AlertBackend>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let counters = Arc::new(Counters::default());
        let limit = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        let dispatcher = runtime.spawn(run_dispatcher(
            rx,
            backend,
            limit.clone(),
            Duration::from_millis(config.timeout_ms),
            counters.clone(),
            reporter.clone(),
        ));
        debug!(
            endpoint = %config.endpoint,
            queue_capacity = config.queue_capacity,
            max_in_flight = config.max_in_flight,
            "Alert transport started"
        );

        Self {
            tx: RwLock::new(Some(tx)),
            counters,
            saturated: AtomicBool::new(false),
            queue_capacity: config.queue_capacity.max(1),
            max_in_flight: config.max_in_flight.max(1),
            limit,
            reporter,
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Queue a copy of `record` for delivery. Returns immediately; `false`
    /// when the event was dropped.
    pub fn forward(&self, record: &LogRecord) -> bool {
        let guard = self.tx.read().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = guard.as_ref() else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        match tx.try_send(AlertEvent::from_record(record)) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                self.saturated.store(false, Ordering::Release);
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                drop(guard);
                if !self.saturated.swap(true, Ordering::AcqRel) {
                    self.reporter.report(
                        "alert queue full, dropping events",
                        vec![Field::new("queue_capacity", self.queue_capacity)],
                    );
                }
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn stats(&self) -> AlertStats {
        AlertStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.read().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    /// Stop accepting events. Already queued events are still delivered.
    pub fn close(&self) {
        self.tx.write().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Close, then wait up to `grace` for queued and in-flight deliveries.
    /// Returns `true` if everything finished in time.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.close();
        let handle = self.dispatcher.lock().unwrap_or_else(PoisonError::into_inner).take();
        let limit = self.limit.clone();
        let permits = self.max_in_flight as u32;
        let wait = async move {
            if let Some(handle) = handle {
                let _ = handle.await;
            }
            let _ = limit.acquire_many(permits).await;
        };
        tokio::time::timeout(grace, wait).await.is_ok()
    }
}

impl Drop for AlertTransport {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_dispatcher(
    mut rx: mpsc::Receiver<AlertEvent>,
    backend: Arc<dyn AlertBackend>,
    limit: Arc<Semaphore>,
    timeout: Duration,
    counters: Arc<Counters>,
    reporter: Arc<dyn Reporter>,
) {
    while let Some(event) = rx.recv().await {
        let Ok(permit) = limit.clone().acquire_owned().await else {
            break;
        };
        let backend = backend.clone();
        let counters = counters.clone();
        let reporter = reporter.clone();
        tokio::spawn(async move {
            let _permit = permit;
            deliver(event, backend.as_ref(), timeout, &counters, reporter.as_ref()).await;
        });
    }
    debug!("Alert dispatcher stopped");
}

async fn deliver(
    event: AlertEvent,
    backend: &dyn AlertBackend,
    timeout: Duration,
    counters: &Counters,
    reporter: &dyn Reporter,
) {
    let error = match tokio::time::timeout(timeout, backend.send(&event)).await {
        Ok(Ok(())) => {
            counters.delivered.fetch_add(1, Ordering::Relaxed);
            return;
        }
        Ok(Err(e)) => format!("{e:#}"),
        Err(_) => format!("timed out after {}ms", timeout.as_millis()),
    };
    counters.failed.fetch_add(1, Ordering::Relaxed);
    reporter.report(
        "alert forward failed",
        vec![
            Field::str("error", error),
            Field::str("event_id", event.event_id.to_string()),
        ],
    );
}
