//! Host configuration.
//!
//! Configuration is loaded from `~/.config/formchat/config.toml` unless a
//! path is given explicitly. Every section is optional.
//!
//! ## Example Configuration
//!
//! ```toml
//! [model]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! base_url = "https://api.openai.com/v1"
//! api_key_env = "OPENAI_API_KEY"
//! timeout_seconds = 60
//! temperature = 0.2
//!
//! [markers]
//! start_message = "hello, i want to fill the form"
//! end_message = "finish"
//! end_token = "END"
//!
//! [storage]
//! data_dir = "/var/lib/formchat"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use formchat::{Config, ConversationMarkers};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat-completions endpoint and generation settings.
    #[serde(default)]
    pub model: ModelSettings,

    /// Synthetic messages exchanged with the model.
    #[serde(default)]
    pub markers: ConversationMarkers,

    /// Where saved conversations live.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Model endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Provider name (informational).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL; the OpenAI endpoint when unset.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Environment variable holding the API key (default: `OPENAI_API_KEY`).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Maximum tokens per reply.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            timeout_seconds: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Data directory (default: `~/.local/share/formchat`).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl AppConfig {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file at an explicit path is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config directory cannot be determined
    /// - An explicitly given file doesn't exist
    /// - Deserialization or validation fails
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::config_path()?, false),
        };

        if !path.exists() {
            if explicit {
                return Err(CliError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| CliError::Config(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization or validation fails.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the default configuration file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::Config("Failed to determine config directory".to_string()))?
            .join("formchat");

        Ok(config_dir.join("config.toml"))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model or API key variable name is empty
    /// - The temperature is outside 0.0 to 2.0
    /// - A marker is empty, or the start and end messages are equal
    pub fn validate(&self) -> Result<()> {
        if self.model.model.trim().is_empty() {
            return Err(CliError::Config("Model must not be empty".to_string()));
        }

        if self.model.api_key_env.trim().is_empty() {
            return Err(CliError::Config(
                "api_key_env must name an environment variable".to_string(),
            ));
        }

        if let Some(temperature) = self.model.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(CliError::Config(format!(
                "Temperature {temperature} is outside 0.0 to 2.0"
            )));
        }

        let markers = &self.markers;
        if markers.start_message.is_empty()
            || markers.end_message.is_empty()
            || markers.end_token.is_empty()
        {
            return Err(CliError::Config("Markers must not be empty".to_string()));
        }

        if markers.start_message == markers.end_message {
            return Err(CliError::Config(format!(
                "Start and end messages must differ (both are '{}')",
                markers.start_message
            )));
        }

        Ok(())
    }

    /// Builds the client configuration, reading the API key from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key variable is unset.
    pub fn client_config(&self) -> Result<Config> {
        self.client_config_with(|name| std::env::var(name).ok())
    }

    /// Builds the client configuration, resolving the API key through
    /// `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if `lookup` yields no key.
    pub fn client_config_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let settings = &self.model;
        let api_key = lookup(&settings.api_key_env).ok_or_else(|| {
            CliError::Config(format!(
                "API key not found: set the {} environment variable",
                settings.api_key_env
            ))
        })?;

        let mut config = Config::new(&settings.provider, &settings.model).with_api_key(api_key);
        config.base_url.clone_from(&settings.base_url);
        config.timeout_seconds = settings.timeout_seconds;
        config.temperature = settings.temperature;
        config.max_tokens = settings.max_tokens;

        Ok(config)
    }

    /// Resolves the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the platform data
    /// directory cannot be determined.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.data_dir {
            return Ok(dir.clone());
        }

        dirs::data_local_dir()
            .map(|dir| dir.join("formchat"))
            .ok_or_else(|| CliError::Config("Failed to determine data directory".to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use formchat::conversation::DEFAULT_END_TOKEN;

    use super::*;

    fn sample_config_toml() -> &'static str {
        r#"
[model]
provider = "openai"
model = "gpt-4o"
base_url = "http://localhost:8080/v1"
api_key_env = "FORMCHAT_TEST_KEY"
timeout_seconds = 30
temperature = 0.3

[markers]
start_message = "start please"
end_token = "DONE"

[storage]
data_dir = "/tmp/formchat-test"
        "#
    }

    #[test]
    fn test_parse_config() {
        let config = AppConfig::from_toml(sample_config_toml()).unwrap();

        assert_eq!(config.model.model, "gpt-4o");
        assert_eq!(config.model.timeout_seconds, Some(30));
        assert_eq!(config.markers.start_message, "start please");
        assert_eq!(config.markers.end_message, "finish");
        assert_eq!(config.markers.end_token, "DONE");
        assert_eq!(
            config.data_dir().unwrap(),
            PathBuf::from("/tmp/formchat-test")
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.markers.end_token, DEFAULT_END_TOKEN);
    }

    #[test]
    fn test_validate_rejects_equal_markers() {
        let err = AppConfig::from_toml(
            r#"
[markers]
start_message = "same"
end_message = "same"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_empty_model_and_bad_temperature() {
        assert!(AppConfig::from_toml("[model]\nmodel = \"\"").is_err());
        assert!(AppConfig::from_toml("[model]\ntemperature = 3.5").is_err());
    }

    #[test]
    fn test_client_config_reads_named_variable() {
        let config = AppConfig::from_toml(sample_config_toml()).unwrap();

        let client_config = config
            .client_config_with(|name| (name == "FORMCHAT_TEST_KEY").then(|| "sk-test".to_string()))
            .unwrap();

        assert!(client_config.api_key.is_some());
        assert_eq!(client_config.model, "gpt-4o");
        assert_eq!(client_config.base_url(), "http://localhost:8080/v1");
        assert_eq!(client_config.temperature, Some(0.3));
    }

    #[test]
    fn test_client_config_missing_key() {
        let config = AppConfig::default();
        let err = config.client_config_with(|_| None).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, sample_config_toml()).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.model.api_key_env, "FORMCHAT_TEST_KEY");
    }
}
