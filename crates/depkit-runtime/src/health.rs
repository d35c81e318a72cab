//! HTTP liveness probing for the model-serving service.

use std::time::Duration;

use async_trait::async_trait;
use depkit_core::{LivenessProbe, ProvisionSettings, RetryPolicy};
use reqwest::Client;
use tokio::time::sleep;
use tracing::debug;

/// Path probed on the service.
pub const LIVENESS_PATH: &str = "/api/tags";

/// Liveness probe issuing `GET /api/tags`.
///
/// Success is a 200 response whose body parses as JSON.
#[derive(Debug, Clone)]
pub struct HttpLivenessProbe {
    client: Client,
    url: String,
}

impl HttpLivenessProbe {
    /// Probe for a service at `base_url` (e.g. `http://127.0.0.1:11434`).
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                debug!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self {
            client,
            url: format!("{}{LIVENESS_PATH}", base_url.trim_end_matches('/')),
        }
    }

    /// Probe configured from settings.
    pub fn from_settings(settings: &ProvisionSettings) -> Self {
        Self::new(&settings.service_base_url(), settings.probe_timeout())
    }
}

#[async_trait]
impl LivenessProbe for HttpLivenessProbe {
    async fn probe(&self) -> bool {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %self.url, "Liveness probe failed: {}", e);
                return false;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            debug!(url = %self.url, status = %response.status(), "Liveness probe returned non-200");
            return false;
        }

        match response.json::<serde_json::Value>().await {
            Ok(_) => true,
            Err(e) => {
                debug!(url = %self.url, "Liveness probe body is not JSON: {}", e);
                false
            }
        }
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

/// Probe until success or until `policy` runs out of attempts.
///
/// The first probe happens immediately; `policy.delay` separates attempts.
pub async fn wait_until_live(probe: &dyn LivenessProbe, policy: RetryPolicy) -> bool {
    let mut attempt = 1;
    loop {
        if probe.probe().await {
            debug!(attempt, "Service answered liveness probe");
            return true;
        }
        if !policy.allows_retry_after(attempt) {
            debug!(attempts = policy.attempts, "Liveness budget exhausted");
            return false;
        }
        attempt += 1;
        sleep(policy.delay).await;
    }
}
