//! Chat assistant core for Tally
//!
//! Forwards conversations to an OpenAI-compatible chat-completions service,
//! extracts the reply from whichever response shape the service returned,
//! and cleans it into plain text for the calculator UI.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod cleanup;
pub mod error;
pub mod extract;
#[cfg(feature = "http")]
pub mod handler;
pub mod normalize;
pub mod protocol;
pub mod state;
pub mod types;
pub mod upstream;

pub use cleanup::{CleanupOptions, Pipeline, Rule};
pub use error::AssistantError;
pub use extract::{Extraction, FALLBACK_GREETING, Strategy, extract};
#[cfg(feature = "http")]
pub use handler::assistant_router;
pub use normalize::Normalizer;
pub use state::{AssistantState, ModelSettings};
pub use types::{ChatMessage, NormalizedReply, ReplySource, Role};
pub use upstream::{HttpUpstream, RawResponse, Upstream};
