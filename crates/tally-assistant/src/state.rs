use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tally_config::AssistantConfig;

use crate::cleanup::CleanupOptions;
use crate::error::AssistantError;
use crate::normalize::Normalizer;
use crate::protocol::{ContentPart, ImageUrl, UpstreamContent, UpstreamMessage, UpstreamRequest};
use crate::types::{ChatMessage, NormalizedReply, Role};
use crate::upstream::{HttpUpstream, Upstream};

/// Message returned for any malformed chat request body
pub const INVALID_MESSAGES: &str = "Invalid messages format";

/// Instruction sent alongside an uploaded image
const SOLVE_PROMPT: &str = "Please analyze this image and solve any mathematical problems you find in it. \
                            Provide a detailed explanation of your solution.";

/// Model parameters for outbound requests
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub vision_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl From<&AssistantConfig> for ModelSettings {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            model: config.model.clone(),
            vision_model: config.vision_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Shared state for the assistant endpoints
///
/// Holds no per-request data; every request builds its own upstream call.
#[derive(Clone)]
pub struct AssistantState {
    inner: Arc<Inner>,
}

struct Inner {
    upstream: Arc<dyn Upstream>,
    normalizer: Normalizer,
    settings: ModelSettings,
    max_image_bytes: usize,
}

impl AssistantState {
    /// Build state around an arbitrary upstream
    pub fn new(upstream: Arc<dyn Upstream>, settings: ModelSettings, options: CleanupOptions) -> Self {
        Self::with_image_limit(upstream, settings, options, AssistantConfig::default().max_image_bytes)
    }

    /// Build state with an explicit upload limit
    pub fn with_image_limit(
        upstream: Arc<dyn Upstream>,
        settings: ModelSettings,
        options: CleanupOptions,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                upstream,
                normalizer: Normalizer::new(options),
                settings,
                max_image_bytes,
            }),
        }
    }

    /// Build state with an HTTP upstream from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream client cannot be created
    pub fn from_config(config: &AssistantConfig) -> anyhow::Result<Self> {
        let upstream = HttpUpstream::from_config(config)?;

        tracing::info!(
            endpoint = upstream.endpoint(),
            model = %config.model,
            vision_model = %config.vision_model,
            credential = config.credential().is_some(),
            "assistant upstream configured"
        );

        Ok(Self::with_image_limit(
            Arc::new(upstream),
            ModelSettings::from(config),
            CleanupOptions {
                single_line: config.single_line,
            },
            config.max_image_bytes,
        ))
    }

    /// Largest accepted image upload in bytes
    pub fn max_image_bytes(&self) -> usize {
        self.inner.max_image_bytes
    }

    /// Forward a conversation upstream and normalize the reply
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<NormalizedReply, AssistantError> {
        if messages.is_empty() {
            return Err(AssistantError::InvalidInput(INVALID_MESSAGES.to_owned()));
        }

        let settings = &self.inner.settings;
        let request = UpstreamRequest {
            model: settings.model.clone(),
            messages: messages.into_iter().map(UpstreamMessage::from).collect(),
            temperature: Some(settings.temperature),
            max_tokens: Some(settings.max_tokens),
            stream: Some(false),
        };

        let raw = self.inner.upstream.send(&request).await?;
        let reply = self.inner.normalizer.normalize_response(raw.status, &raw.body)?;

        tracing::info!(
            upstream = self.inner.upstream.name(),
            source = ?reply.source,
            chars = reply.content.chars().count(),
            "chat reply ready"
        );

        Ok(reply)
    }

    /// Send an image to the vision model and return its solution
    pub async fn solve(&self, image: &[u8], mime: &str) -> Result<String, AssistantError> {
        if image.is_empty() {
            return Err(AssistantError::InvalidInput("No image provided".to_owned()));
        }

        let data_uri = format!("data:{mime};base64,{}", STANDARD.encode(image));

        let settings = &self.inner.settings;
        let request = UpstreamRequest {
            model: settings.vision_model.clone(),
            messages: vec![UpstreamMessage {
                role: Role::User,
                content: UpstreamContent::Parts(vec![
                    ContentPart::Text {
                        text: SOLVE_PROMPT.to_owned(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_uri },
                    },
                ]),
            }],
            temperature: None,
            max_tokens: Some(settings.max_tokens),
            stream: Some(false),
        };

        let raw = self.inner.upstream.send(&request).await?;
        let solution = self.inner.normalizer.solution(raw.status, &raw.body)?;

        tracing::info!(
            upstream = self.inner.upstream.name(),
            image_bytes = image.len(),
            chars = solution.chars().count(),
            "image solution ready"
        );

        Ok(solution)
    }
}
