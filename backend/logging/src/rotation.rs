//! Hour-aligned rotation scheduling.
//!
//! The first rotation fires one second before the next top of the hour
//! (second 59 of minute 59); every later one fires a full period after the
//! previous attempt, whether or not that attempt succeeded. Failures are
//! reported and otherwise ignored until the next cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};
use tokio::time::{Instant, sleep_until};
use tracelog_core::{Field, LogError};
use tracing::debug;

use crate::report::Reporter;
use crate::sink::Rotate;

pub const ROTATION_PERIOD: Duration = Duration::from_secs(3600);

/// Wall-clock source for aligning the schedule.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Delay from `now_unix` until one second before the next hour boundary.
pub fn first_rotation_delay(now_unix: i64) -> Duration {
    let period = ROTATION_PERIOD.as_secs() as i64;
    let secs = period - now_unix.rem_euclid(period) - 1;
    Duration::from_secs(secs.max(0) as u64)
}

/// Owns the background rotation task of one logger.
///
/// Starting is guarded: a second [`RotationScheduler::start`] on the same
/// instance is a no-op that returns `Ok(false)`, even after
/// [`RotationScheduler::stop`].
#[derive(Debug, Default)]
pub struct RotationScheduler {
    started: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RotationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the scheduling loop on the current tokio runtime.
    pub fn start(
        &self,
        target: Arc<dyn Rotate>,
        clock: Arc<dyn Clock>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<bool, LogError> {
        let runtime =
            Handle::try_current().map_err(|_| LogError::RuntimeUnavailable("the rotation scheduler"))?;
        if self.started.swap(true, Ordering::AcqRel) {
            debug!("Rotation scheduler already started");
            return Ok(false);
        }

        let handle = runtime.spawn(run_schedule(target, clock, reporter));
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(true)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Abort the loop. An in-flight rotation runs on the blocking pool and
    /// always completes.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
        }
    }
}

impl Drop for RotationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_schedule(target: Arc<dyn Rotate>, clock: Arc<dyn Clock>, reporter: Arc<dyn Reporter>) {
    let now = clock.now_unix();
    let delay = first_rotation_delay(now);
    let mut deadline = Instant::now() + delay;
    let mut wall = now + delay.as_secs() as i64;
    debug!(first_delay_secs = delay.as_secs(), "Rotation scheduler started");

    loop {
        if let Some(at) = DateTime::<Utc>::from_timestamp(wall, 0) {
            target.arm(at);
        }
        sleep_until(deadline).await;

        let rotating = target.clone();
        match task::spawn_blocking(move || rotating.rotate()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => reporter.report("log rotate error", vec![Field::error(&e)]),
            Err(e) => reporter.report("log rotate error", vec![Field::error(&e)]),
        }

        deadline += ROTATION_PERIOD;
        wall += ROTATION_PERIOD.as_secs() as i64;
    }
}
