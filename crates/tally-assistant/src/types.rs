use serde::{Deserialize, Serialize};

use crate::extract::Strategy;

/// Role of a conversation participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the user
    User,
    /// Reply produced by the assistant
    Assistant,
}

/// Single message of the conversation sent by the browser
///
/// Extra fields the UI attaches (ids, timestamps) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Build a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Inbound body of `POST /api/chat`
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Assistant reply returned to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedReply {
    /// Cleaned reply text, never empty
    pub content: String,
    /// Always [`Role::Assistant`]
    pub role: Role,
    /// Where the content came from
    #[serde(skip)]
    pub source: ReplySource,
}

/// Origin of a [`NormalizedReply`]'s content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Extracted by the given strategy and kept after cleanup
    Extracted(Strategy),
    /// Upstream returned a reply field holding only whitespace
    Blank,
    /// No extraction strategy found any text
    Empty,
    /// Text was extracted but cleanup left nothing presentable
    Filtered(Strategy),
}

impl ReplySource {
    /// Whether the fallback greeting was substituted
    pub const fn is_fallback(self) -> bool {
        !matches!(self, Self::Extracted(_))
    }
}

/// Response body of `POST /api/solve`
#[derive(Debug, Clone, Serialize)]
pub struct SolveReply {
    pub result: String,
}
