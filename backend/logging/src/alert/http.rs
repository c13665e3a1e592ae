use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracelog_core::LogError;

use super::{AlertBackend, AlertEvent};

/// POSTs each event as JSON to the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpAlertBackend {
    client: reqwest::Client,
    url: String,
}

impl HttpAlertBackend {
    /// `endpoint` may be `host:port` or a full URL; `http://` is assumed
    /// when no scheme is given.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, LogError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LogError::Config(format!("failed to build alert HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: normalize_endpoint(endpoint),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

#[async_trait]
impl AlertBackend for HttpAlertBackend {
    async fn send(&self, event: &AlertEvent) -> Result<()> {
        self.client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .with_context(|| format!("alert request to {} failed", self.url))?
            .error_for_status()
            .context("alert backend rejected event")?;
        Ok(())
    }
}
