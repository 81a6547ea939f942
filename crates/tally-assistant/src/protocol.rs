//! Chat-completions wire format sent to the upstream service

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Role};

/// Outbound chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<UpstreamMessage>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Always `false`, replies are read in one piece
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Message within an upstream request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub role: Role,
    pub content: UpstreamContent,
}

impl From<ChatMessage> for UpstreamMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: message.role,
            content: UpstreamContent::Text(message.content),
        }
    }
}

/// Content is a string or an array of content parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpstreamContent {
    /// Plain text content
    Text(String),
    /// Text and image parts
    Parts(Vec<ContentPart>),
}

/// Individual content part
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text {
        /// The text string
        text: String,
    },
    /// Image given as a URL or base64 data URI
    ImageUrl {
        /// Image location
        image_url: ImageUrl,
    },
}

/// Image reference, a URL or a data URI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chat_request_wire_shape() {
        let request = UpstreamRequest {
            model: "qwen-turbo".to_owned(),
            messages: vec![ChatMessage::user("2+2?").into()],
            temperature: Some(0.7),
            max_tokens: Some(1000),
            stream: Some(false),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "qwen-turbo",
                "messages": [{"role": "user", "content": "2+2?"}],
                "temperature": 0.7,
                "max_tokens": 1000,
                "stream": false
            })
        );
    }

    #[test]
    fn image_parts_wire_shape() {
        let message = UpstreamMessage {
            role: Role::User,
            content: UpstreamContent::Parts(vec![
                ContentPart::Text {
                    text: "Solve this".to_owned(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "data:image/png;base64,AAAA".to_owned(),
                    },
                },
            ]),
        };

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "Solve this"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                ]
            })
        );
    }
}
