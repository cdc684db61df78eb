//! Provider configuration
//!
//! Read from the environment (after the CLI has loaded any `.env` file):
//! `OPENAI_BASE_URL`, `OPENAI_API_KEY`, `VIBECHECK_TIMEOUT_SECS`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "VIBECHECK_TIMEOUT_SECS";

/// Chat-completions endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API root; `/chat/completions` is appended
    pub base_url: String,
    /// Bearer token; required before any request is sent
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Sampling temperature; 0.0 keeps decoding deterministic
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
        }
    }
}

impl ProviderConfig {
    /// Build a config from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup
    ///
    /// Blank values count as unset; an unparsable timeout falls back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        ProviderConfig {
            base_url: get(ENV_BASE_URL).unwrap_or(defaults.base_url),
            api_key: get(ENV_API_KEY),
            timeout_secs: get(ENV_TIMEOUT_SECS)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.timeout_secs),
            temperature: defaults.temperature,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of the chat-completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
