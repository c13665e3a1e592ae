use std::sync::Arc;
use std::thread;

use tracelog::config::{
    OutputConfiguration, OutputKinds, RunMode, SeverityAction, SeverityPolicy, parse_config, ConfigFormat,
};
use tracelog::{AlertPriority, Level, Logger, MemorySink, TraceContext, fields};

fn logger_with(config: OutputConfiguration) -> (Logger, MemorySink) {
    let sink = MemorySink::new();
    let logger = Logger::builder(config.with_outputs(OutputKinds::NONE).with_sampling(None))
        .with_sink(Arc::new(sink.clone()))
        .build()
        .unwrap();
    (logger, sink)
}

#[test]
fn run_mode_test_info_scenario() {
    let (logger, sink) = logger_with(OutputConfiguration::new("risk", RunMode::Test));

    logger.info(&TraceContext::background(), "info test", fields!["int" => 100]);
    logger.info(&TraceContext::with_request_id("abc-123"), "info test", fields!["int" => 100]);

    let lines = sink.json_lines();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert_eq!(line["level"], "info");
        assert_eq!(line["msg"], "info test");
        assert_eq!(line["int"], 100);
        assert_eq!(line["logger"], "risk");
    }
    assert!(lines[0].get("x_request_id").is_none());
    assert_eq!(lines[1]["x_request_id"], "abc-123");
}

#[test]
fn error_without_priority_is_tagged_third() {
    let (logger, sink) = logger_with(OutputConfiguration::new("risk", RunMode::Prod));
    logger.error(&TraceContext::background(), "boom", vec![]);
    logger.error_with_priority(&TraceContext::background(), AlertPriority::Second, "boom", vec![]);
    logger.warn(&TraceContext::background(), "meh", vec![]);

    let lines = sink.json_lines();
    assert_eq!(lines[0]["x_error_priority"], "Alert3");
    assert_eq!(lines[1]["x_error_priority"], "Alert2");
    assert!(lines[2].get("x_error_priority").is_none());
    assert!(lines[0]["stacktrace"].as_str().is_some());
}

#[test]
fn below_threshold_produces_zero_bytes() {
    let (logger, sink) = logger_with(OutputConfiguration::new("risk", RunMode::Prod).with_level(Level::Warn));
    logger.debug(&TraceContext::background(), "d", vec![]);
    logger.info(&TraceContext::background(), "i", vec![]);
    assert_eq!(sink.len(), 0);

    logger.set_level(Level::Debug);
    logger.debug(&TraceContext::background(), "d", vec![]);
    assert_eq!(sink.lines().len(), 1);
}

#[test]
#[should_panic(expected = "unrecoverable state")]
fn critical_aborts_under_default_policy() {
    let (logger, _sink) = logger_with(OutputConfiguration::new("risk", RunMode::Prod));
    logger.critical(&TraceContext::background(), "unrecoverable state", vec![]);
}

#[test]
fn critical_can_be_record_only() {
    let policy = SeverityPolicy::default().with_action(Level::Critical, SeverityAction::Record);
    let (logger, sink) =
        logger_with(OutputConfiguration::new("risk", RunMode::Prod).with_severity_policy(policy));
    logger.critical(&TraceContext::background(), "still alive", vec![]);

    let lines = sink.json_lines();
    assert_eq!(lines[0]["level"], "crit");
    assert_eq!(lines[0]["x_error_priority"], "Alert3");
}

#[test]
fn concurrent_level_changes_settle_on_last_write() {
    let (logger, _sink) = logger_with(OutputConfiguration::new("risk", RunMode::Prod));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let logger = logger.clone();
            thread::spawn(move || {
                for n in 0..500 {
                    let level = Level::ALL[(i + n) % Level::ALL.len()];
                    logger.set_level(level);
                    let _ = logger.level();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    logger.set_level(Level::Warn);
    assert_eq!(logger.level(), Level::Warn);
}

#[test]
fn loaded_config_drives_the_logger() {
    let raw = r#"
        component = "billing"
        runMode = "dev"
        encoding = "console"
        level = "warn"
    "#;
    let config = parse_config(raw, ConfigFormat::Toml, &|_| None).unwrap();
    let (logger, sink) = logger_with(config);
    assert_eq!(logger.level(), Level::Warn);

    logger.warn(&TraceContext::background(), "console line", fields!["k" => "v"]);
    let line = sink.lines().remove(0);
    let cols: Vec<&str> = line.split('\t').collect();
    assert_eq!(cols[1], "WARN");
    assert_eq!(cols[2], "billing");
    assert_eq!(cols[4], "console line");
}

#[test]
fn failing_sink_is_reported_through_the_others() {
    struct Full;

    impl tracelog::Sink for Full {
        fn name(&self) -> &str {
            "full-disk"
        }

        fn write(&self, _line: &[u8]) -> std::io::Result<()> {
            Err(std::io::Error::other("no space left"))
        }

        fn flush(&self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let sink = MemorySink::new();
    let config = OutputConfiguration::new("risk", RunMode::Prod)
        .with_outputs(OutputKinds::NONE)
        .with_sampling(None);
    let logger = Logger::builder(config)
        .with_sink(Arc::new(Full))
        .with_sink(Arc::new(sink.clone()))
        .build()
        .unwrap();

    logger.info(&TraceContext::background(), "hello", vec![]);
    let lines = sink.json_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["msg"], "hello");
    assert_eq!(lines[1]["msg"], "log sink write failed");
    assert_eq!(lines[1]["sink"], "full-disk");
}
