use std::path::Path;
use std::time::Duration;

use crate::Config;

/// Bounds accepted for the upstream timeout
const MIN_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_TIMEOUT: Duration = Duration::from_secs(120);

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// A missing credential is not a load error: the server starts and
    /// answers chat requests with a configuration error until it is set.
    ///
    /// # Errors
    ///
    /// Returns an error if any assistant setting is out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_assistant()?;
        self.validate_health()?;

        if self.assistant.credential().is_none() {
            tracing::warn!("assistant.api_key is not set, chat requests will fail until it is configured");
        }

        Ok(())
    }

    fn validate_assistant(&self) -> anyhow::Result<()> {
        let assistant = &self.assistant;

        let timeout = assistant.timeout_duration()?;
        if !(MIN_TIMEOUT..=MAX_TIMEOUT).contains(&timeout) {
            anyhow::bail!(
                "assistant.timeout must be between {}s and {}s",
                MIN_TIMEOUT.as_secs(),
                MAX_TIMEOUT.as_secs()
            );
        }

        if assistant.model.trim().is_empty() || assistant.vision_model.trim().is_empty() {
            anyhow::bail!("assistant.model and assistant.vision_model must not be empty");
        }

        if !(0.0..=2.0).contains(&assistant.temperature) {
            anyhow::bail!("assistant.temperature must be between 0 and 2");
        }

        if assistant.max_tokens == 0 {
            anyhow::bail!("assistant.max_tokens must be greater than 0");
        }

        if assistant.max_image_bytes == 0 {
            anyhow::bail!("assistant.max_image_bytes must be greater than 0");
        }

        if !matches!(assistant.base_url.scheme(), "http" | "https") {
            anyhow::bail!("assistant.base_url must use http or https");
        }

        Ok(())
    }

    fn validate_health(&self) -> anyhow::Result<()> {
        let health = &self.server.health;

        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        Ok(())
    }
}
