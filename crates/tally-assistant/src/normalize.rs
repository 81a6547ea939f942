//! Upstream response normalization
//!
//! Turns a raw upstream status and body into either a presentable reply or
//! a classified [`AssistantError`].

use http::StatusCode;
use serde_json::Value;

use crate::cleanup::{CleanupOptions, Pipeline};
use crate::error::AssistantError;
use crate::extract::{self, Extraction, FALLBACK_GREETING};
use crate::types::{NormalizedReply, ReplySource, Role};

/// Maximum characters of a raw upstream body surfaced as an error message
const RAW_ERROR_CHARS: usize = 100;

/// Extraction and cleanup for upstream responses
#[derive(Debug, Clone)]
pub struct Normalizer {
    reply: Pipeline,
    solution: Pipeline,
}

impl Normalizer {
    pub fn new(options: CleanupOptions) -> Self {
        Self {
            reply: Pipeline::chat(options),
            solution: Pipeline::solution(options),
        }
    }

    /// Normalize a raw upstream response into a chat reply
    ///
    /// Missing or blank content is not an error here: the fallback
    /// greeting is substituted and recorded in [`NormalizedReply::source`].
    pub fn normalize_response(&self, status: StatusCode, raw: &str) -> Result<NormalizedReply, AssistantError> {
        let extraction = parse(status, raw)?;
        Ok(self.reply_from(extraction))
    }

    /// Normalize an already parsed body into a chat reply
    pub fn normalize(&self, body: &Value) -> NormalizedReply {
        self.reply_from(extract::extract(body))
    }

    /// Normalize a raw upstream response into an image solution
    ///
    /// Unlike chat replies, an empty solution is an error.
    pub fn solution(&self, status: StatusCode, raw: &str) -> Result<String, AssistantError> {
        let Extraction::Found { strategy, text } = parse(status, raw)? else {
            return Err(AssistantError::EmptyContent);
        };

        let solution = self.solution.clean(&text).trim().to_owned();
        if solution.is_empty() {
            return Err(AssistantError::EmptyContent);
        }

        tracing::debug!(strategy = strategy.as_str(), "extracted solution");
        Ok(solution)
    }

    fn reply_from(&self, extraction: Extraction) -> NormalizedReply {
        let (content, source) = match extraction {
            Extraction::Found { strategy, text } => {
                let content = self.reply.clean(&text);
                let source = if content == FALLBACK_GREETING && text.trim() != FALLBACK_GREETING {
                    ReplySource::Filtered(strategy)
                } else {
                    ReplySource::Extracted(strategy)
                };
                (content, source)
            }
            Extraction::Blank => (FALLBACK_GREETING.to_owned(), ReplySource::Blank),
            Extraction::Missing => (FALLBACK_GREETING.to_owned(), ReplySource::Empty),
        };

        if source.is_fallback() {
            tracing::warn!(?source, "no presentable reply text, using fallback greeting");
        }

        NormalizedReply {
            content,
            role: Role::Assistant,
            source,
        }
    }
}

/// Classify the raw response and extract its reply text
fn parse(status: StatusCode, raw: &str) -> Result<Extraction, AssistantError> {
    if !status.is_success() {
        return Err(AssistantError::UpstreamHttp {
            status,
            message: upstream_error_message(status, raw),
        });
    }

    let body: Value = serde_json::from_str(raw).map_err(|e| {
        tracing::error!(error = %e, body = %truncate_chars(raw, RAW_ERROR_CHARS), "upstream body is not JSON");
        AssistantError::MalformedJson(e.to_string())
    })?;

    let extraction = extract::extract(&body);

    // Some upstreams report failures with a 2xx status and an error body
    if extraction == Extraction::Missing
        && let Some(message) = extract::error_message(&body)
    {
        return Err(AssistantError::UpstreamHttp {
            status: StatusCode::BAD_GATEWAY,
            message,
        });
    }

    Ok(extraction)
}

/// Error message for a non-success upstream response
///
/// Prefers `error.message`, then a string `error`, then the start of the
/// raw body.
pub fn upstream_error_message(status: StatusCode, raw: &str) -> String {
    if let Some(message) = serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|body| extract::error_message(&body))
    {
        return message;
    }

    let truncated = truncate_chars(raw.trim(), RAW_ERROR_CHARS);
    if truncated.is_empty() {
        format!("AI service returned {status}")
    } else {
        truncated.to_owned()
    }
}

/// Longest prefix of `text` holding at most `max` characters
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices().nth(max).map_or(text, |(end, _)| &text[..end])
}
