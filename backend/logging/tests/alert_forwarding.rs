use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracelog::config::{AlertConfig, OutputConfiguration, OutputKinds, RunMode};
use tracelog::{AlertBackend, AlertEvent, AlertPriority, Level, Logger, MemorySink, TraceContext, fields};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(endpoint: &str) -> OutputConfiguration {
    OutputConfiguration::new("risk", RunMode::Prod)
        .with_outputs(OutputKinds::NONE)
        .with_sampling(None)
        .with_alert(AlertConfig::new(endpoint))
}

async fn wait_for(mut done: impl FnMut() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("condition not reached in time");
}

/// Never completes a delivery.
struct Hanging;

#[async_trait]
impl AlertBackend for Hanging {
    async fn send(&self, _event: &AlertEvent) -> anyhow::Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

#[tokio::test]
async fn unreachable_endpoint_yields_one_warn_self_report() {
    let sink = MemorySink::new();
    let logger = Logger::builder(config("127.0.0.1:1"))
        .with_sink(Arc::new(sink.clone()))
        .build()
        .unwrap();

    logger.error(&TraceContext::background(), "payment failed", fields!["order" => 17]);
    wait_for(|| logger.alert_stats().map(|s| s.failed) == Some(1)).await;

    let lines = sink.json_lines();
    let warns: Vec<_> = lines.iter().filter(|l| l["level"] == "warn").collect();
    assert_eq!(warns.len(), 1);
    assert_eq!(warns[0]["msg"], "alert forward failed");
    assert!(warns[0]["error"].as_str().is_some());
    assert_eq!(lines.iter().filter(|l| l["level"] == "error").count(), 1);
    logger.shutdown();
}

#[tokio::test]
async fn forwarding_never_blocks_the_caller() {
    let logger = Logger::builder(config("unused:1"))
        .with_sink(Arc::new(MemorySink::new()))
        .with_alert_backend(Arc::new(Hanging))
        .build()
        .unwrap();

    let started = Instant::now();
    for _ in 0..50 {
        logger.error(&TraceContext::background(), "stuck backend", vec![]);
    }
    assert!(started.elapsed() < Duration::from_secs(1));
    logger.shutdown();
}

#[tokio::test]
async fn events_reach_the_http_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let logger = Logger::builder(config(&server.uri()))
        .with_sink(Arc::new(MemorySink::new()))
        .build()
        .unwrap();
    let ctx = TraceContext::with_request_id("req-5");
    logger.error_with_priority(&ctx, AlertPriority::First, "card declined", fields!["amount" => 12.5]);
    wait_for(|| logger.alert_stats().map(|s| s.delivered) == Some(1)).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let event: AlertEvent = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(event.message, "card declined");
    assert_eq!(event.priority, AlertPriority::First);
    assert_eq!(event.request_id.as_deref(), Some("req-5"));
    assert_eq!(event.level, Level::Error);
    assert!(logger.shutdown_and_drain(Duration::from_secs(1)).await);
}

#[tokio::test]
async fn records_below_threshold_are_not_forwarded() {
    let sink = MemorySink::new();
    let logger = Logger::builder(config("unused:1").with_level(Level::Critical))
        .with_sink(Arc::new(sink.clone()))
        .with_alert_backend(Arc::new(Hanging))
        .build()
        .unwrap();

    logger.error(&TraceContext::background(), "suppressed", vec![]);
    logger.warn(&TraceContext::background(), "suppressed", vec![]);
    assert_eq!(logger.alert_stats().unwrap().enqueued, 0);
    assert!(sink.is_empty());
    logger.shutdown();
}

#[tokio::test]
async fn warnings_are_never_forwarded() {
    let logger = Logger::builder(config("unused:1"))
        .with_sink(Arc::new(MemorySink::new()))
        .with_alert_backend(Arc::new(Hanging))
        .build()
        .unwrap();

    logger.warn(&TraceContext::background(), "just a warning", vec![]);
    logger.error(&TraceContext::background(), "a real error", vec![]);
    assert_eq!(logger.alert_stats().unwrap().enqueued, 1);
    logger.shutdown();
}
