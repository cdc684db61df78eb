//! Chat-completions client
//!
//! Posts `{model, messages, temperature}` to `{base_url}/chat/completions`
//! and returns the first choice's message content.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vibecheck_core::{GenerationError, Generator, Message};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::Result;

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// First choice's content; `None` when absent, null, or empty.
    pub(crate) fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
    }
}

pub(crate) fn build_request<'a>(
    messages: &'a [Message],
    model: &'a str,
    temperature: f32,
) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        temperature,
    }
}

/// [`Generator`] over an OpenAI-compatible HTTP endpoint
pub struct OpenAiChatClient {
    config: ProviderConfig,
    http_client: reqwest::Client,
}

impl OpenAiChatClient {
    /// Create a client; fails only if the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("vibecheck/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;

        Ok(OpenAiChatClient {
            config,
            http_client,
        })
    }

    /// Create a client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ProviderConfig::from_env())
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Request one completion.
    pub async fn complete(&self, messages: &[Message], model: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey)?;

        let url = self.config.completions_url();
        let request = build_request(messages, model, self.config.temperature);
        debug!(url = %url, model = %model, messages = messages.len(), "Sending chat completion");

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        parsed.into_content().ok_or(ProviderError::NoContent)
    }
}

#[async_trait]
impl Generator for OpenAiChatClient {
    async fn generate(
        &self,
        messages: &[Message],
        model: &str,
    ) -> std::result::Result<String, GenerationError> {
        self.complete(messages, model)
            .await
            .map_err(GenerationError::from)
    }
}
