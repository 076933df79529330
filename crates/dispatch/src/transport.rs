//! Alert transport port and its implementations.
//!
//! A transport performs exactly one POST and reports the HTTP status it
//! got back. Deciding what counts as success and whether to retry is the
//! dispatcher's job.

use std::time::Duration;

use async_trait::async_trait;

/// HTTP request timeout for a single delivery attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// A POST that produced no HTTP status at all.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failure reported by a transport that is not built on reqwest.
    #[error("Transport failed: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Sends one alert request.
#[async_trait]
pub trait AlertTransport: Send + Sync {
    /// POST `body` as JSON to `url` and return the response status code.
    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<u16, TransportError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// reqwest-backed transport used in production.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl AlertTransport for HttpTransport {
    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<u16, TransportError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status().as_u16();

        // The body is only interesting for troubleshooting rejected alerts.
        let text = response.text().await.unwrap_or_default();
        tracing::debug!(status, response = %text, "Alert endpoint answered");

        Ok(status)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
