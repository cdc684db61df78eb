//! Error types for the provider client

use thiserror::Error;
use vibecheck_core::GenerationError;

/// Errors raised while talking to a chat-completions endpoint
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No API key in the config or environment
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    /// Client construction or request transport failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Endpoint answered with a non-success status
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a chat completion
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Completion had no choices or no message content
    #[error("completion contained no message content")]
    NoContent,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err.to_string())
    }
}

impl From<ProviderError> for GenerationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingApiKey => GenerationError::Config(err.to_string()),
            ProviderError::Http(msg) => GenerationError::Transport(msg),
            ProviderError::Status { status, body } => GenerationError::Status { status, body },
            ProviderError::Json(e) => GenerationError::Decode(e.to_string()),
            ProviderError::NoContent => GenerationError::EmptyResponse,
        }
    }
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
