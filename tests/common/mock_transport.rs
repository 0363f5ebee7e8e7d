//! Mock Transport for Testing
//!
//! Provides controlled responses and artificial delays for
//! integration tests.

use async_trait::async_trait;
use querysmith::core::transport::{Transport, WireFailure, WireResponse};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock transport that returns a predetermined response
pub struct MockTransport {
    /// The response every post settles with
    response: Result<WireResponse, WireFailure>,
    /// Artificial delay before settling
    delay: Duration,
    /// Record all request bodies received (for verification)
    pub received_bodies: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new(response: Result<WireResponse, WireFailure>) -> Self {
        Self {
            response,
            delay: Duration::ZERO,
            received_bodies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 2xx response with a raw body
    pub fn with_status(status: u16, status_text: &str, body: &str) -> Self {
        Self::new(Ok(WireResponse {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        }))
    }

    /// 200 response wrapping `content` in a well-formed chat envelope
    pub fn with_reply_content(content: &str) -> Self {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string();
        Self::with_status(200, "OK", &body)
    }

    /// Connection-level failure
    pub fn with_failure(code: &str, message: &str) -> Self {
        Self::new(Err(WireFailure {
            message: message.to_string(),
            code: code.to_string(),
        }))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, _url: &str, json_body: String) -> Result<WireResponse, WireFailure> {
        // Record received request
        if let Ok(mut bodies) = self.received_bodies.lock() {
            bodies.push(json_body);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_canned_response() {
        let mock = MockTransport::with_status(200, "OK", "{}");
        let result = mock.post("http://unused", "{}".to_string()).await.unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(mock.received_bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockTransport::with_failure("connect", "refused");
        let result = mock.post("http://unused", "{}".to_string()).await;
        assert_eq!(result.unwrap_err().code, "connect");
    }
}
