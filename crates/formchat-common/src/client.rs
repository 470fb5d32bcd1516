use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Default endpoint for OpenAI-compatible chat completions.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings and generation defaults for a model client.
///
/// Built once at startup and shared read-only by every request.
///
/// # Security
///
/// The `api_key` is a `SecretString`: it is never serialized and is redacted
/// from `Debug` output.
///
/// # Examples
///
/// ```
/// use formchat_common::Config;
///
/// let config = Config::new("openai", "gpt-4o-mini")
///     .with_api_key("sk-...")
///     .with_timeout(30)
///     .with_temperature(0.2);
///
/// assert_eq!(config.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider name, informational only (e.g., "openai").
    pub provider: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Base URL of the API; [`DEFAULT_BASE_URL`] when unset.
    pub base_url: Option<String>,
    /// Bearer credential.
    #[serde(skip_serializing, default)]
    pub api_key: Option<SecretString>,
    /// Per-request timeout in seconds. `None` disables the timeout.
    pub timeout_seconds: Option<u64>,
    /// Sampling temperature (0.0 to 2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate per reply.
    pub max_tokens: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            base_url: None,
            api_key: None,
            timeout_seconds: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl Config {
    /// Creates a configuration for the given provider and model.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Sets a custom base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into().into()));
        self
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum tokens per reply.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// The effective base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// The request timeout, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}
