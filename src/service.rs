//! Keyword Service
//!
//! Orchestrates one user action end to end: resolve instruction
//! templates, build the role-tagged payload, dispatch, normalize the
//! reply, record history. One logical request per action; nothing here
//! retries automatically.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::dispatcher::{ChatMessage, ChatRequest, RequestDispatcher, RequestOutcome};
use crate::core::normalizer::{LabelSet, NormalizedReply, ResponseNormalizer};
use crate::core::transport::{HttpTransport, Transport};
use crate::error::{QueryError, QueryResult};
use crate::history;
use crate::prompts::{self, PromptContext};

/// Generates and explains advanced-search commands via the model endpoint
pub struct KeywordService {
    config: Config,
    transport: Arc<dyn Transport>,
    dispatcher: RequestDispatcher,
    normalizer: ResponseNormalizer,
}

impl KeywordService {
    pub fn new(config: Config) -> Self {
        let hop_ms = hop_timeout(&config);
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(&config.api_key, hop_ms));
        Self::with_transport(config, transport)
    }

    /// Build a service over any transport (tests plug in mocks here)
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let dispatcher = RequestDispatcher::new(&config.api_url, transport.clone());
        let labels = LabelSet::new(
            config.keyword_labels.clone(),
            config.explanation_labels.clone(),
        );
        Self {
            config,
            transport,
            dispatcher,
            normalizer: ResponseNormalizer::new(labels),
        }
    }

    /// Verify the endpoint is reachable
    pub async fn health_check(&self) -> bool {
        self.transport.health_check(&self.config.api_url).await
    }

    /// Generate one search command from a described intent
    pub async fn generate(&self, query: &str) -> QueryResult<NormalizedReply> {
        debug!(query, "generating search command");
        let context = PromptContext::new(
            &self.config.generator_prompt,
            &self.config.explainer_prompt,
            query,
        );
        let content = self.round_trip(&context.generator, &context.user_text).await?;
        let reply = self.normalizer.normalize(&content, None);
        self.finish("generate", reply)
    }

    /// Explain a search command the user already has
    pub async fn explain(&self, keyword: &str) -> QueryResult<NormalizedReply> {
        debug!(keyword, "explaining search command");
        let context = PromptContext::new(
            &self.config.generator_prompt,
            &self.config.explainer_prompt,
            keyword,
        );
        let content = self.round_trip(&context.explainer, &context.user_text).await?;
        // The term under explanation seeds the cascade's context label
        let reply = self.normalizer.normalize(&content, Some(keyword));
        self.finish("explain", reply)
    }

    async fn round_trip(&self, instructions: &str, user_text: &str) -> QueryResult<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(instructions),
                ChatMessage::user(user_text),
                ChatMessage::system(prompts::language_directive(&self.config.reply_language)),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        match self
            .dispatcher
            .dispatch(&request, self.config.deadline_ms)
            .await
        {
            RequestOutcome::Success { body } => Ok(body),
            RequestOutcome::HttpError {
                status,
                status_text,
                body_preview,
            } => Err(QueryError::Http {
                status,
                status_text,
                body_preview,
            }),
            RequestOutcome::TransportError { message, code } => {
                Err(QueryError::Transport { message, code })
            }
            RequestOutcome::Envelope { detail, .. } => Err(QueryError::Envelope { detail }),
            RequestOutcome::Timeout { elapsed_ms } => Err(QueryError::Timeout { elapsed_ms }),
        }
    }

    fn finish(&self, kind: &str, reply: NormalizedReply) -> QueryResult<NormalizedReply> {
        if reply.is_degraded() {
            warn!(kind, "reply did not match any extraction stage, returning degraded record");
        }
        if self.config.history_enabled {
            if let Err(e) = history::append(kind, &reply.record) {
                warn!("could not write history entry: {}", e);
            }
        }
        Ok(reply)
    }
}

/// Transport hop bound, kept strictly below the dispatch deadline so
/// the inner layer always times out first and failures stay
/// attributable to the hop that caused them.
fn hop_timeout(config: &Config) -> u64 {
    if config.transport_timeout_ms < config.deadline_ms {
        return config.transport_timeout_ms;
    }
    let clamped = (config.deadline_ms.saturating_sub(config.deadline_ms / 10)).max(1);
    warn!(
        configured = config.transport_timeout_ms,
        deadline = config.deadline_ms,
        clamped,
        "transport timeout must stay below the dispatch deadline, clamping"
    );
    clamped
}
