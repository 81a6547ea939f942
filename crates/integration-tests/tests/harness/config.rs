//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use secrecy::SecretString;
use tally_config::{AssistantConfig, Config, CorsConfig, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Configuration pointed at `base_url` with a test credential
    pub fn new(base_url: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                assistant: AssistantConfig {
                    api_key: Some(SecretString::from("test-key")),
                    base_url: base_url.parse().expect("valid URL"),
                    timeout: "5s".to_owned(),
                    ..AssistantConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Remove the upstream credential
    pub fn without_api_key(mut self) -> Self {
        self.config.assistant.api_key = None;
        self
    }

    /// Set the upstream timeout (e.g. "1s")
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        timeout.clone_into(&mut self.config.assistant.timeout);
        self
    }

    /// Flatten replies to one line
    pub fn single_line(mut self) -> Self {
        self.config.assistant.single_line = true;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
