//! Reply extraction from upstream payloads of uncertain shape
//!
//! Each [`Strategy`] probes one known response layout. Strategies run in a
//! fixed priority order and the first one yielding non-blank text wins.

use serde_json::Value;
use strum::IntoStaticStr;

/// Greeting substituted when no presentable reply text exists
pub const FALLBACK_GREETING: &str = "Hi! How can I assist you today?";

/// Marker preceding the answer inside reasoning output
const FINAL_RESPONSE_MARKER: &str = "**Final Response**\n";

/// Known reply locations, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    /// `choices[0].message.content`
    MessageContent,
    /// `choices[0].message.text`
    MessageText,
    /// `choices[0].message` as a bare string
    MessageString,
    /// `choices[0].text`
    ChoiceText,
    /// `results[0].text`
    ResultText,
    /// Answer recovered from `choices[0].message.reasoning`
    Reasoning,
}

impl Strategy {
    /// Stable name for logs
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

type Extractor = fn(&Value) -> Option<String>;

const EXTRACTORS: [(Strategy, Extractor); 6] = [
    (Strategy::MessageContent, message_content),
    (Strategy::MessageText, message_text),
    (Strategy::MessageString, message_string),
    (Strategy::ChoiceText, choice_text),
    (Strategy::ResultText, result_text),
    (Strategy::Reasoning, reasoning),
];

/// Outcome of probing an upstream payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A strategy produced non-blank text
    Found {
        /// Strategy that matched
        strategy: Strategy,
        /// Raw text, not yet cleaned
        text: String,
    },
    /// A reply field exists but holds only whitespace
    Blank,
    /// No reply field exists at all
    Missing,
}

/// Probe `body` with every strategy in priority order
pub fn extract(body: &Value) -> Extraction {
    for (strategy, extractor) in EXTRACTORS {
        if let Some(text) = extractor(body) {
            return Extraction::Found { strategy, text };
        }
    }

    if has_blank_reply(body) {
        Extraction::Blank
    } else {
        Extraction::Missing
    }
}

/// Message from an error-shaped body: `error.message`, or `error` when it is a string
pub fn error_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .or_else(|| body.get("error"))
        .and_then(non_blank)
}

fn message_content(body: &Value) -> Option<String> {
    match body.pointer("/choices/0/message/content")? {
        Value::Array(parts) => {
            let joined: String = parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str).is_none_or(|t| t == "text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            (!joined.trim().is_empty()).then_some(joined)
        }
        other => non_blank(other),
    }
}

fn message_text(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/text").and_then(non_blank)
}

fn message_string(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message").and_then(non_blank)
}

fn choice_text(body: &Value) -> Option<String> {
    body.pointer("/choices/0/text").and_then(non_blank)
}

fn result_text(body: &Value) -> Option<String> {
    body.pointer("/results/0/text").and_then(non_blank)
}

fn reasoning(body: &Value) -> Option<String> {
    let message = body.pointer("/choices/0/message")?;
    let reasoning = message
        .get("reasoning")
        .or_else(|| message.get("reasoning_content"))?
        .as_str()?;

    let start = reasoning.find(FINAL_RESPONSE_MARKER)? + FINAL_RESPONSE_MARKER.len();
    let answer = &reasoning[start..];
    let answer = answer.find("\n\n").map_or(answer, |end| &answer[..end]);

    let answer = answer.trim();
    (!answer.is_empty()).then(|| answer.to_owned())
}

fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(ToOwned::to_owned)
}

fn has_blank_reply(body: &Value) -> bool {
    [
        "/choices/0/message/content",
        "/choices/0/message/text",
        "/choices/0/message",
        "/choices/0/text",
        "/results/0/text",
    ]
    .iter()
    .any(|pointer| body.pointer(pointer).is_some_and(Value::is_string))
}
