use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

/// Default upstream chat-completions base URL
pub const DEFAULT_BASE_URL: &str = "https://api.qwen.ai/v1";

/// Chat assistant configuration
///
/// Passed into the assistant state at construction time; nothing reads
/// the process environment while serving requests.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    /// Bearer credential for the upstream service
    ///
    /// Optional so the server can start without it; requests fail with a
    /// configuration error until it is set.
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Upstream base URL, `/chat/completions` is appended
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Model used for chat replies
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used for image solving
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upstream call timeout (e.g. "30s")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Flatten replies to a single line
    #[serde(default)]
    pub single_line: bool,
    /// Largest accepted image upload in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            vision_model: default_vision_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout: default_timeout(),
            single_line: false,
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

impl AssistantConfig {
    /// Credential, treating an empty value as absent
    pub fn credential(&self) -> Option<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
    }

    /// Parsed upstream timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is not parseable
    pub fn timeout_duration(&self) -> anyhow::Result<Duration> {
        duration_str::parse(&self.timeout)
            .map_err(|e| anyhow::anyhow!("invalid assistant.timeout '{}': {e}", self.timeout))
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("valid default URL")
}

fn default_model() -> String {
    "qwen-turbo".to_string()
}

fn default_vision_model() -> String {
    "qwen-vl-chat".to_string()
}

const fn default_temperature() -> f64 {
    0.7
}

const fn default_max_tokens() -> u32 {
    1000
}

fn default_timeout() -> String {
    "30s".to_string()
}

const fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}
