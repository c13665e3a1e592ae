use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracelog::config::{OutputConfiguration, OutputKinds, RunMode};
use tracelog::{Clock, Logger, TraceContext, fields};

/// Puts the first scheduled rotation almost an hour away.
struct TopOfHour;

impl Clock for TopOfHour {
    fn now_unix(&self) -> i64 {
        0
    }
}

fn dir_stats(dir: &Path) -> (usize, u64) {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().metadata().unwrap().len())
        .fold((0, 0), |(n, total), len| (n + 1, total + len))
}

#[tokio::test]
async fn size_cap_triggers_exactly_one_early_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let config = OutputConfiguration::new("risk", RunMode::Prod)
        .with_outputs(OutputKinds::FILE)
        .with_file_path(dir.path().join("risk.log"))
        .with_max_file_bytes(100_000)
        .with_sampling(None);
    let logger = Logger::builder(config).with_clock(Arc::new(TopOfHour)).build().unwrap();
    assert!(logger.rotation_scheduled());

    let padding = "x".repeat(200);
    let ctx = TraceContext::background();
    let mut i = 0u64;
    while dir_stats(dir.path()).1 < 150_000 {
        logger.info(&ctx, "bulk write", fields!["seq" => i, "padding" => padding.as_str()]);
        i += 1;
    }
    logger.flush().unwrap();

    let (files, _) = dir_stats(dir.path());
    assert_eq!(files, 2, "expected the active file plus one rotated segment");
    for entry in fs::read_dir(dir.path()).unwrap() {
        assert!(entry.unwrap().metadata().unwrap().len() <= 100_000);
    }
    logger.shutdown();
}

#[tokio::test]
async fn manual_rotation_splits_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("risk.log");
    let config = OutputConfiguration::new("risk", RunMode::Release)
        .with_outputs(OutputKinds::FILE)
        .with_file_path(&path);
    let logger = Logger::builder(config).with_clock(Arc::new(TopOfHour)).build().unwrap();
    let ctx = TraceContext::with_request_id("req-7");

    logger.info(&ctx, "before rotation", vec![]);
    logger.rotate().unwrap();
    logger.info(&ctx, "after rotation", vec![]);

    let active = fs::read_to_string(&path).unwrap();
    assert!(active.contains("after rotation"));
    assert!(!active.contains("before rotation"));
    assert!(active.contains("\"x_request_id\":\"req-7\""));
    assert_eq!(dir_stats(dir.path()).0, 2);
    logger.shutdown();
}

#[tokio::test]
async fn failed_manual_rotation_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    let config = OutputConfiguration::new("risk", RunMode::Prod)
        .with_outputs(OutputKinds::FILE)
        .with_file_path(logs.join("risk.log"));
    let logger = Logger::builder(config).with_clock(Arc::new(TopOfHour)).build().unwrap();

    fs::remove_dir_all(&logs).unwrap();
    assert!(logger.rotate().is_err());
    logger.shutdown();
}

#[test]
fn test_mode_discards_file_output_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("risk.log");
    let config = OutputConfiguration::new("risk", RunMode::Test)
        .with_outputs(OutputKinds::FILE)
        .with_file_path(&path);

    // No runtime needed: nothing is rotated.
    let logger = Logger::new(&config).unwrap();
    logger.info(&TraceContext::background(), "dropped", vec![]);
    assert!(!logger.rotation_scheduled());
    assert!(!path.exists());
    logger.rotate().unwrap();
}

#[tokio::test]
async fn failing_size_rotation_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    // Fits as the active name; the timestamped name exceeds NAME_MAX.
    let path = dir.path().join(format!("{}.log", "r".repeat(240)));
    let config = OutputConfiguration::new("risk", RunMode::Prod)
        .with_outputs(OutputKinds::FILE)
        .with_file_path(&path)
        .with_max_file_bytes(10)
        .with_sampling(None);
    let logger = Logger::builder(config).with_clock(Arc::new(TopOfHour)).build().unwrap();

    let ctx = TraceContext::background();
    for i in 0..3 {
        logger.info(&ctx, "tick", fields!["seq" => i]);
    }
    logger.flush().unwrap();

    let lines: Vec<serde_json::Value> = fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    let warns: Vec<_> = lines.iter().filter(|l| l["level"] == "warn").collect();
    assert_eq!(warns.len(), 1);
    assert_eq!(warns[0]["msg"], "log rotate error");
    assert!(warns[0]["error"].as_str().unwrap().contains("log rotation failed"));
    assert_eq!(dir_stats(dir.path()).0, 1);
    logger.shutdown();
}
