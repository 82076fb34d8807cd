//! reqwest-backed transport for provider calls

use std::time::Duration;

use async_trait::async_trait;
use idea_validator_domain::usecases::REQUEST_TIMEOUT;
use idea_validator_domain::{ModelTransport, ProviderRequest, TransportError};
use reqwest::Client;
use serde_json::Value;

/// HTTP transport sending provider requests as JSON POSTs
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Client timeout, capped at the per-call bound the orchestrator enforces
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let timeout = timeout.min(REQUEST_TIMEOUT);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timed_out(&self) -> TransportError {
        TransportError::Timeout {
            seconds: self.timeout.as_secs(),
        }
    }
}

#[async_trait]
impl ModelTransport for HttpTransport {
    async fn send(&self, request: ProviderRequest) -> Result<Value, TransportError> {
        let mut builder = self.client.post(&request.endpoint).json(&request.payload);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                self.timed_out()
            } else {
                // Strip the URL: Google carries the key in the query string
                TransportError::Network(e.without_url().to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(
                provider = %request.provider,
                status = status.as_u16(),
                "Provider returned an error status"
            );
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.timed_out()
            } else {
                TransportError::Body(e.without_url().to_string())
            }
        })
    }
}
