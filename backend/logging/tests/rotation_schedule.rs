use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracelog::config::{OutputConfiguration, OutputKinds, RunMode};
use tracelog::{Clock, Field, LogError, Logger, MemorySink, Reporter, Rotate, RotationScheduler};

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

/// Records when each rotation attempt happened; optionally fails them.
struct Target {
    fired: Mutex<Vec<Instant>>,
    fail: AtomicBool,
}

impl Target {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fired: Mutex::new(Vec::new()),
            fail: AtomicBool::new(fail),
        })
    }

    fn fired(&self) -> Vec<Instant> {
        self.fired.lock().unwrap().clone()
    }
}

impl Rotate for Target {
    fn rotate(&self) -> Result<(), LogError> {
        self.fired.lock().unwrap().push(Instant::now());
        if self.fail.load(Ordering::SeqCst) {
            return Err(LogError::Rotation {
                path: "svc.log".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
struct Reports(Mutex<Vec<String>>);

impl Reporter for Reports {
    fn report(&self, message: &str, _fields: Vec<Field>) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

#[tokio::test(start_paused = true)]
async fn first_rotation_lands_on_second_59() {
    let target = Target::new(false);
    let scheduler = RotationScheduler::new();
    let start = Instant::now();
    scheduler
        .start(target.clone(), Arc::new(FixedClock(10 * 3600 + 3000)), Arc::new(Reports::default()))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(598)).await;
    assert!(target.fired().is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let fired = target.fired();
    assert_eq!(fired.len(), 1);
    let offset = fired[0] - start;
    assert!(offset >= Duration::from_secs(599) && offset < Duration::from_secs(600), "{offset:?}");
    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn failed_rotation_is_reported_and_rescheduled() {
    let target = Target::new(true);
    let reports = Arc::new(Reports::default());
    let scheduler = RotationScheduler::new();
    scheduler
        .start(target.clone(), Arc::new(FixedClock(3000)), reports.clone())
        .unwrap();

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(reports.0.lock().unwrap().as_slice(), ["log rotate error"]);

    target.fail.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(3600)).await;

    let fired = target.fired();
    assert_eq!(fired.len(), 2);
    assert_eq!(fired[1] - fired[0], Duration::from_secs(3600));
    assert_eq!(reports.0.lock().unwrap().len(), 1);
    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn keeps_hourly_cadence() {
    let target = Target::new(false);
    let scheduler = RotationScheduler::new();
    scheduler
        .start(target.clone(), Arc::new(FixedClock(3599)), Arc::new(Reports::default()))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(3 * 3600 + 1)).await;
    let fired = target.fired();
    assert_eq!(fired.len(), 4);
    for pair in fired.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_secs(3600));
    }
    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_future_rotations() {
    let target = Target::new(false);
    let scheduler = RotationScheduler::new();
    scheduler
        .start(target.clone(), Arc::new(FixedClock(0)), Arc::new(Reports::default()))
        .unwrap();
    scheduler.stop();

    tokio::time::sleep(Duration::from_secs(2 * 3600)).await;
    assert!(target.fired().is_empty());
}

#[tokio::test(start_paused = true)]
async fn logger_writes_scheduled_rotation_failure_to_its_sinks() {
    let dir = tempfile::tempdir().unwrap();
    // Fits as the active name; the timestamped name exceeds NAME_MAX.
    let path = dir.path().join(format!("{}.log", "r".repeat(240)));
    let config = OutputConfiguration::new("risk", RunMode::Prod)
        .with_outputs(OutputKinds::FILE)
        .with_file_path(&path)
        .with_sampling(None);
    let memory = MemorySink::new();
    let logger = Logger::builder(config)
        .with_clock(Arc::new(FixedClock(3000)))
        .with_sink(Arc::new(memory.clone()))
        .build()
        .unwrap();

    tokio::time::sleep(Duration::from_secs(598)).await;
    assert!(memory.is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let lines = memory.json_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "warn");
    assert_eq!(lines[0]["msg"], "log rotate error");
    assert!(lines[0]["error"].as_str().unwrap().contains("log rotation failed"));
    assert!(std::fs::read_to_string(&path).unwrap().contains("log rotate error"));
    logger.shutdown();
}
