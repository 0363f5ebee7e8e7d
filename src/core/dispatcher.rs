//! Request Dispatch
//!
//! Performs exactly one request/response cycle against the configured
//! chat-completions endpoint and classifies the result. All failure
//! variants are returned as values; nothing is thrown past this
//! boundary, so the caller decides whether to surface, retry, or
//! degrade.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::core::transport::Transport;
use crate::utils::text::truncate_to_char_boundary;

/// Longest error-body excerpt carried in an outcome. Full bodies are
/// never logged or surfaced; upstream error payloads can embed
/// credentials.
const BODY_PREVIEW_BYTES: usize = 200;

/// One role-tagged message in the outbound payload
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Outbound chat-completions payload
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Response envelope: only the nested content path matters here
#[derive(Debug, Deserialize)]
struct ChatEnvelope {
    #[serde(default)]
    choices: Vec<EnvelopeChoice>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeChoice {
    message: EnvelopeMessage,
}

#[derive(Debug, Deserialize)]
struct EnvelopeMessage {
    content: Option<String>,
}

/// Classified result of one dispatch attempt
///
/// Created per call and consumed immediately; never persisted.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    /// 2xx and the envelope yielded its nested reply content
    Success { body: String },
    /// Non-2xx; preview is bounded, status passed through unchanged
    HttpError {
        status: u16,
        status_text: String,
        body_preview: String,
    },
    /// DNS/connect/request-level failure below HTTP
    TransportError { message: String, code: String },
    /// 2xx but the body is not the expected envelope shape
    Envelope {
        detail: String,
        body_preview: String,
    },
    /// Deadline fired before the transport settled
    Timeout { elapsed_ms: u64 },
}

/// Dispatches one payload through the transport with a bounded deadline
pub struct RequestDispatcher {
    url: String,
    transport: Arc<dyn Transport>,
}

impl RequestDispatcher {
    pub fn new(url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            url: url.to_string(),
            transport,
        }
    }

    /// Send one request and classify the outcome
    ///
    /// The deadline timer starts at call time. If the transport has not
    /// settled when it fires, the in-flight future is dropped
    /// (cooperative cancellation) and `Timeout` is returned; a late
    /// upstream completion can never surface as `Success`.
    pub async fn dispatch(&self, request: &ChatRequest, deadline_ms: u64) -> RequestOutcome {
        let json_body = match serde_json::to_string(request) {
            Ok(body) => body,
            Err(e) => {
                return RequestOutcome::TransportError {
                    message: e.to_string(),
                    code: "serialize".to_string(),
                }
            }
        };

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            deadline_ms,
            "dispatching chat request"
        );

        let started = Instant::now();
        let settled = tokio::time::timeout(
            Duration::from_millis(deadline_ms),
            self.transport.post(&self.url, json_body),
        )
        .await;

        let response = match settled {
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(elapsed_ms, "request exceeded deadline, cancelled");
                return RequestOutcome::Timeout { elapsed_ms };
            }
            Ok(Err(failure)) => {
                warn!(code = %failure.code, "transport failure: {}", failure.message);
                return RequestOutcome::TransportError {
                    message: failure.message,
                    code: failure.code,
                };
            }
            Ok(Ok(response)) => response,
        };

        debug!(status = response.status, bytes = response.body.len(), "response received");

        // Body is already full text here: never assume an error body parses
        if !(200..300).contains(&response.status) {
            let preview = preview(&response.body);
            warn!(
                status = response.status,
                "API error {}: {}", response.status_text, preview
            );
            return RequestOutcome::HttpError {
                status: response.status,
                status_text: response.status_text,
                body_preview: preview,
            };
        }

        self.extract_content(&response.body)
    }

    /// Pull `choices[0].message.content` out of a 2xx body
    fn extract_content(&self, body: &str) -> RequestOutcome {
        let envelope: ChatEnvelope = match serde_json::from_str(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("response body is not a valid envelope: {}", e);
                return RequestOutcome::Envelope {
                    detail: e.to_string(),
                    body_preview: preview(body),
                };
            }
        };

        match envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
        {
            Some(content) if !content.is_empty() => RequestOutcome::Success { body: content },
            _ => {
                warn!("envelope parsed but choices[0].message.content is missing");
                RequestOutcome::Envelope {
                    detail: "missing choices[0].message.content".to_string(),
                    body_preview: preview(body),
                }
            }
        }
    }
}

fn preview(body: &str) -> String {
    truncate_to_char_boundary(body, BODY_PREVIEW_BYTES).to_string()
}
