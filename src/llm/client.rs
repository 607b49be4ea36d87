//! Chat-completion client for OpenAI-compatible endpoints
//!
//! The system prompt travels with each request instead of living on the client,
//! so concurrent operations never see each other's directives.

use crate::config::{ApiConfig, Config, SystemPromptPlacement};
use crate::error::{Result, ResumeTailorError};
use crate::llm::message::{Message, Role};
pub use crate::llm::streaming::TextStream;
use crate::llm::streaming::sse_text_stream;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// One completion call: an optional system directive plus the ordered conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { system: None, messages }
    }

    /// Single user turn, the shape every generation operation uses
    pub fn user(prompt: impl Into<String>) -> Self {
        Self::new(vec![Message::user(prompt)])
    }

    /// Blank directives count as no directive
    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system.filter(|s| !s.trim().is_empty());
        self
    }
}

#[async_trait]
pub trait Completion: Send + Sync {
    /// Returns the first choice's text
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    async fn stream(&self, request: CompletionRequest) -> Result<TextStream>;
}

/// Final message list sent upstream. Rejects empty input and a second system message.
pub fn arrange_messages(
    request: CompletionRequest,
    placement: SystemPromptPlacement,
) -> Result<Vec<Message>> {
    if request.messages.is_empty() {
        return Err(ResumeTailorError::EmptyInput);
    }

    let caller_system = request.messages.iter().filter(|m| m.role == Role::System).count();
    if caller_system + usize::from(request.system.is_some()) > 1 {
        return Err(ResumeTailorError::InvalidInput(
            "a completion request may carry at most one system message".to_string(),
        ));
    }

    let mut messages = request.messages;
    if let Some(system) = request.system {
        match placement {
            SystemPromptPlacement::Trailing => messages.push(Message::system(system)),
            SystemPromptPlacement::Leading => messages.insert(0, Message::system(system)),
        }
    }
    Ok(messages)
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client for `POST {base_url}/chat/completions`
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    placement: SystemPromptPlacement,
}

impl CompletionClient {
    pub fn new(config: &ApiConfig, api_key: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| ResumeTailorError::Configuration("API key contains invalid characters".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ResumeTailorError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            placement: config.system_prompt_placement,
        })
    }

    /// Build from configuration, reading the credential from the environment
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key();
        if api_key.is_none() {
            warn!(
                "{} is not set; completion requests will be rejected upstream",
                config.api.api_key_env
            );
        }
        Self::new(&config.api, api_key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response> {
        let body = ChatRequestBody {
            model: &self.model,
            messages,
            stream,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ResumeTailorError::Upstream(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ResumeTailorError::Upstream(format!("status {}: {}", status.as_u16(), message)));
        }

        Ok(response)
    }
}

#[async_trait]
impl Completion for CompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let messages = arrange_messages(request, self.placement)?;
        let started = Instant::now();
        debug!("Completion request: model={} messages={}", self.model, messages.len());

        let response = self.post(&messages, false).await?;
        let raw: ChatResponse = response
            .json()
            .await
            .map_err(|e| ResumeTailorError::Upstream(format!("Malformed completion response: {}", e)))?;

        if let Some(usage) = &raw.usage {
            debug!(
                "Completion done in {}ms: prompt_tokens={} completion_tokens={}",
                started.elapsed().as_millis(),
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        raw.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ResumeTailorError::Upstream("Completion response has no content".to_string()))
    }

    async fn stream(&self, request: CompletionRequest) -> Result<TextStream> {
        let messages = arrange_messages(request, self.placement)?;
        debug!("Streaming request: model={} messages={}", self.model, messages.len());

        let response = self.post(&messages, true).await?;
        Ok(sse_text_stream(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest::new(vec![Message::user("first"), Message::assistant("second")])
            .with_system(Some("be concise".to_string()))
    }

    #[test]
    fn test_system_message_trails_by_default() {
        let messages = arrange_messages(request(), SystemPromptPlacement::Trailing).unwrap();
        assert_eq!(
            messages,
            vec![
                Message::user("first"),
                Message::assistant("second"),
                Message::system("be concise"),
            ]
        );
    }

    #[test]
    fn test_leading_placement_prepends() {
        let messages = arrange_messages(request(), SystemPromptPlacement::Leading).unwrap();
        assert_eq!(messages[0], Message::system("be concise"));
        assert_eq!(&messages[1..], &[Message::user("first"), Message::assistant("second")]);
    }

    #[test]
    fn test_without_system_messages_pass_through() {
        let req = CompletionRequest::user("only").with_system(Some("   ".to_string()));
        let messages = arrange_messages(req, SystemPromptPlacement::Trailing).unwrap();
        assert_eq!(messages, vec![Message::user("only")]);
    }

    #[test]
    fn test_empty_messages_rejected() {
        let req = CompletionRequest::new(vec![]).with_system(Some("sys".to_string()));
        let err = arrange_messages(req, SystemPromptPlacement::Trailing).unwrap_err();
        assert!(matches!(err, ResumeTailorError::EmptyInput));
    }

    #[test]
    fn test_second_system_message_rejected() {
        let req = CompletionRequest::new(vec![Message::system("a"), Message::user("b")])
            .with_system(Some("c".to_string()));
        assert!(arrange_messages(req, SystemPromptPlacement::Trailing).is_err());
    }
}
