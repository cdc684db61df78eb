//! Vibecheck Provider
//!
//! HTTP implementation of the core [`vibecheck_core::Generator`] capability
//! against any OpenAI-compatible `chat/completions` endpoint.

pub mod client;
pub mod config;
pub mod error;

pub use client::OpenAiChatClient;
pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
