//! HTTP health checking for the supervised application.
//!
//! A probe makes a single bounded request to the application's health
//! endpoint on the loopback interface. It has no policy of its own; the
//! monitor applies interval/retry semantics on top.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, info};

use gantry_core::domain::ProbeOutcome;
use gantry_core::ports::HealthProbe;

/// Single-shot HTTP probe bound by the policy timeout.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    url: String,
    client: Client,
}

impl HttpHealthProbe {
    /// Create a probe for `http://127.0.0.1:<port><path>`.
    ///
    /// `timeout` bounds every attempt; an attempt exceeding it counts as
    /// exactly one failure.
    pub fn new(port: u16, path: &str, timeout: Duration) -> Result<Self> {
        let url = format!("http://127.0.0.1:{}{}", port, path);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }

    /// The URL this probe targets.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self) -> ProbeOutcome {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Success,
            Ok(response) => {
                ProbeOutcome::failure(format!("health endpoint returned {}", response.status()))
            }
            Err(e) if e.is_timeout() => ProbeOutcome::failure("health check timeout"),
            Err(e) if e.is_connect() => ProbeOutcome::failure("connection refused"),
            Err(e) => ProbeOutcome::failure(format!("health check failed: {}", e)),
        }
    }
}

/// Check HTTP health of the application once.
///
/// Returns whether the health endpoint responded with a success status
/// within `timeout`.
pub async fn check_http_health(port: u16, path: &str, timeout: Duration) -> Result<bool> {
    let probe = HttpHealthProbe::new(port, path, timeout)?;
    Ok(probe.probe().await.is_success())
}

/// Wait for the HTTP health check to succeed.
///
/// Polls the application's health endpoint once per second until it
/// returns a success status or `timeout_secs` is reached.
pub async fn wait_for_http_health(port: u16, path: &str, timeout_secs: u64) -> Result<()> {
    let probe = HttpHealthProbe::new(port, path, Duration::from_secs(2))?;
    info!("Waiting for application to be ready at {}", probe.url());

    let max_attempts = timeout_secs.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        sleep(Duration::from_secs(1)).await;

        match probe.probe().await {
            ProbeOutcome::Success => {
                info!("Application is ready on port {}", port);
                return Ok(());
            }
            outcome => {
                debug!(?outcome, attempt, "Health check not ready, retrying");
            }
        }

        if attempt >= max_attempts {
            return Err(anyhow::anyhow!(
                "Application did not become healthy within {}s on port {}",
                max_attempts,
                port
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_unreachable_port_is_a_failure() {
        // Nothing listens on this port.
        let probe =
            HttpHealthProbe::new(65432, "/_stcore/health", Duration::from_millis(500)).unwrap();
        let outcome = probe.probe().await;
        assert!(matches!(outcome, ProbeOutcome::Failure { .. }));
    }

    #[tokio::test]
    async fn check_http_health_reports_false_when_down() {
        let healthy = check_http_health(65433, "/_stcore/health", Duration::from_millis(500))
            .await
            .unwrap();
        assert!(!healthy);
    }

    #[test]
    fn probe_url_is_loopback() {
        let probe =
            HttpHealthProbe::new(8501, "/_stcore/health", Duration::from_secs(10)).unwrap();
        assert_eq!(probe.url(), "http://127.0.0.1:8501/_stcore/health");
    }
}
