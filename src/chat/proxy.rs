//! Completions proxy with ordered model fallback.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::fallback::try_in_order;
use super::types::ChatMessage;
use crate::config::ChatConfig;

/// Model families whose upstream endpoints reject the `system` role.
const SYSTEM_ROLE_UNSUPPORTED: &[&str] = &["google", "gemma", "gemini"];

/// Maximum characters of an upstream error body kept in failure details.
const MAX_ERROR_BODY: usize = 500;

/// Chat proxy errors.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// No messages to forward.
    #[error("messages must not be empty")]
    EmptyConversation,

    /// No API key configured.
    #[error("chat service is not configured")]
    NotConfigured,

    /// Every candidate model failed.
    #[error("all models failed, last error: {last_error}")]
    Unavailable {
        /// Number of candidates tried.
        attempts: usize,
        /// Detail of the final failure.
        last_error: String,
    },

    /// HTTP client construction failed.
    #[error("http client error: {0}")]
    Client(String),
}

/// Failure of a single candidate.
#[derive(Debug)]
enum CandidateError {
    Status { status: u16, body: String },
    Transport(String),
    Decode(String),
}

impl fmt::Display for CandidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateError::Status { status, body } => write!(f, "HTTP {status}: {body}"),
            CandidateError::Transport(e) => write!(f, "request failed: {e}"),
            CandidateError::Decode(e) => write!(f, "invalid response body: {e}"),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Proxy to the upstream completions endpoint.
pub struct ChatProxy {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    models: Vec<String>,
    system_prompt: String,
}

impl ChatProxy {
    /// Build a proxy from configuration.
    ///
    /// The client carries the per-request timeout and the attribution
    /// headers; an empty API key leaves the proxy unconfigured.
    pub fn new(config: &ChatConfig) -> Result<Self, ProxyError> {
        let mut headers = HeaderMap::new();
        for (name, value) in [("http-referer", &config.referer), ("x-title", &config.title)] {
            if value.is_empty() {
                continue;
            }
            let value = HeaderValue::from_str(value)
                .map_err(|e| ProxyError::Client(format!("invalid {name} header: {e}")))?;
            headers.insert(HeaderName::from_static(name), value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ProxyError::Client(format!("failed to create HTTP client: {e}")))?;

        let api_key = Some(config.api_key.trim())
            .filter(|k| !k.is_empty())
            .map(String::from);

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            models: config.models.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Candidate models in priority order.
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Send the conversation to each candidate model in order and return the
    /// first successful response body unchanged.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, ProxyError> {
        if messages.is_empty() {
            return Err(ProxyError::EmptyConversation);
        }
        let api_key = self.api_key.as_deref().ok_or(ProxyError::NotConfigured)?;

        let result = try_in_order(self.models.iter(), |model| async move {
            let prepared = prepare_messages(model, messages, &self.system_prompt);
            let outcome = self.request(api_key, model, &prepared).await;
            if let Err(ref e) = outcome {
                warn!(model = %model, error = %e, "Chat candidate failed");
            }
            outcome
        })
        .await;

        match result {
            Ok((model, body)) => {
                info!(model = %model, "Chat completion served");
                Ok(body)
            }
            Err(exhausted) => {
                let last_error = exhausted
                    .last()
                    .map(|a| a.error.to_string())
                    .unwrap_or_else(|| "no models configured".to_string());
                warn!(attempts = exhausted.attempts.len(), "All chat candidates failed");
                Err(ProxyError::Unavailable {
                    attempts: exhausted.attempts.len(),
                    last_error,
                })
            }
        }
    }

    async fn request(
        &self,
        api_key: &str,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<Value, CandidateError> {
        debug!(model, messages = messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&CompletionRequest { model, messages })
            .send()
            .await
            .map_err(|e| CandidateError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CandidateError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CandidateError::Decode(e.to_string()))
    }
}

/// Apply the system prompt for a given model.
///
/// Models from families that reject the `system` role get the prompt folded
/// into the first user message (or a new leading user message if there is
/// none). Other models get a leading `system` message. An empty prompt
/// leaves the conversation unchanged.
pub fn prepare_messages(
    model: &str,
    messages: &[ChatMessage],
    system_prompt: &str,
) -> Vec<ChatMessage> {
    let prompt = system_prompt.trim();
    if prompt.is_empty() {
        return messages.to_vec();
    }

    let model = model.to_lowercase();
    if SYSTEM_ROLE_UNSUPPORTED.iter().any(|f| model.contains(f)) {
        let mut folded = messages.to_vec();
        match folded.iter_mut().find(|m| m.is_user()) {
            Some(first_user) => first_user.content = format!("{prompt} {}", first_user.content),
            None => folded.insert(0, ChatMessage::user(prompt)),
        }
        folded
    } else {
        let mut with_system = Vec::with_capacity(messages.len() + 1);
        with_system.push(ChatMessage::system(prompt));
        with_system.extend_from_slice(messages);
        with_system
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "You are a helpful assistant.";

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("What is a lathe?"),
            ChatMessage::assistant("A machine tool."),
            ChatMessage::user("And a mill?"),
        ]
    }

    #[test]
    fn test_prepare_messages_gemma_folds_prompt() {
        let prepared = prepare_messages("google/gemma-3-12b-it:free", &conversation(), PROMPT);

        assert_eq!(prepared.len(), 3);
        assert!(prepared.iter().all(|m| m.role != "system"));
        assert_eq!(
            prepared[0].content,
            "You are a helpful assistant. What is a lathe?"
        );
        assert_eq!(prepared[2].content, "And a mill?");
    }

    #[test]
    fn test_prepare_messages_gemini_case_insensitive() {
        let prepared = prepare_messages("Vendor/Gemini-Pro", &conversation(), PROMPT);
        assert!(prepared.iter().all(|m| m.role != "system"));
    }

    #[test]
    fn test_prepare_messages_fold_without_user_message() {
        let messages = vec![ChatMessage::assistant("Hello")];
        let prepared = prepare_messages("google/gemma-2", &messages, PROMPT);

        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0], ChatMessage::user(PROMPT));
        assert_eq!(prepared[1], ChatMessage::assistant("Hello"));
    }

    #[test]
    fn test_prepare_messages_leading_system() {
        let prepared = prepare_messages(
            "meta-llama/llama-3.3-70b-instruct:free",
            &conversation(),
            PROMPT,
        );

        assert_eq!(prepared.len(), 4);
        assert_eq!(prepared[0], ChatMessage::system(PROMPT));
        assert_eq!(prepared[1].content, "What is a lathe?");
    }

    #[test]
    fn test_prepare_messages_empty_prompt() {
        let prepared = prepare_messages("google/gemma-2", &conversation(), "  ");
        assert_eq!(prepared, conversation());
    }

    #[test]
    fn test_new_without_key_is_unconfigured() {
        let config = ChatConfig::default();
        let proxy = ChatProxy::new(&config).unwrap();

        assert!(!proxy.is_configured());
        assert_eq!(proxy.models().len(), config.models.len());
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_conversation() {
        let config = ChatConfig {
            api_key: "sk-test".to_string(),
            ..ChatConfig::default()
        };
        let proxy = ChatProxy::new(&config).unwrap();

        assert!(matches!(
            proxy.complete(&[]).await,
            Err(ProxyError::EmptyConversation)
        ));
    }

    #[tokio::test]
    async fn test_complete_without_key() {
        let proxy = ChatProxy::new(&ChatConfig::default()).unwrap();

        assert!(matches!(
            proxy.complete(&[ChatMessage::user("hi")]).await,
            Err(ProxyError::NotConfigured)
        ));
    }
}
