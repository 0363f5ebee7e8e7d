//! Network Transport Seam
//!
//! Narrow async boundary between the dispatcher and the wire. The
//! dispatcher classifies outcomes; the transport only moves bytes and
//! reports connection-level failures. Tests plug in a mock transport
//! with a programmable delay.

use async_trait::async_trait;
use std::time::Duration;

/// Raw HTTP response before any outcome classification
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

/// Connection-level failure (DNS, connect, TLS, body read)
#[derive(Debug, Clone)]
pub struct WireFailure {
    pub message: String,
    pub code: String,
}

/// Trait for network transports
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body and return the raw response
    async fn post(&self, url: &str, json_body: String) -> Result<WireResponse, WireFailure>;

    /// Probe endpoint reachability
    /// Default implementation assumes reachable (mocks, local stubs)
    async fn health_check(&self, _url: &str) -> bool {
        true
    }
}

/// reqwest-backed transport used in production
///
/// The per-request timeout is the transport hop bound; the dispatcher
/// enforces that its own deadline stays strictly above it.
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(api_key: &str, timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn classify(e: &reqwest::Error) -> &'static str {
        if e.is_timeout() {
            "timeout"
        } else if e.is_connect() {
            "connect"
        } else if e.is_request() {
            "request"
        } else if e.is_body() || e.is_decode() {
            "read"
        } else {
            "other"
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, json_body: String) -> Result<WireResponse, WireFailure> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json_body)
            .timeout(self.timeout);

        // A relay normally injects the key; attach it only when talking
        // to the upstream directly
        if !self.api_key.is_empty() {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            );
        }

        let response = request.send().await.map_err(|e| WireFailure {
            message: e.to_string(),
            code: Self::classify(&e).to_string(),
        })?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("Unknown").to_string();

        let body = response.text().await.map_err(|e| WireFailure {
            message: e.to_string(),
            code: "read".to_string(),
        })?;

        Ok(WireResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }

    async fn health_check(&self, url: &str) -> bool {
        match self
            .client
            .get(models_url(url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Derive the model-listing URL from a chat-completions endpoint
fn models_url(api_url: &str) -> String {
    let base = api_url
        .trim_end_matches('/')
        .trim_end_matches("/chat/completions");
    format!("{}/models", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_url() {
        assert_eq!(
            models_url("https://openkey.cloud/v1/chat/completions"),
            "https://openkey.cloud/v1/models"
        );
        assert_eq!(
            models_url("https://openkey.cloud/v1/chat/completions/"),
            "https://openkey.cloud/v1/models"
        );
    }
}
