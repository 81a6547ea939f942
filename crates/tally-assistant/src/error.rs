use std::time::Duration;

use http::StatusCode;
use tally_core::HttpError;
use thiserror::Error;

/// Errors that can occur while answering a chat or solve request
#[derive(Debug, Error)]
pub enum AssistantError {
    /// No upstream credential is configured
    #[error("API key not configured")]
    Config,

    /// Client sent a malformed request
    #[error("{0}")]
    InvalidInput(String),

    /// Upstream answered with a non-success status or an error-shaped body
    #[error("upstream returned {status}: {message}")]
    UpstreamHttp {
        /// Status to report to the client
        status: StatusCode,
        /// Message extracted from the upstream body
        message: String,
    },

    /// Upstream body was not JSON
    #[error("malformed upstream response: {0}")]
    MalformedJson(String),

    /// Upstream body held no extractable text
    #[error("upstream returned no content")]
    EmptyContent,

    /// Upstream call did not complete in time
    #[error("upstream request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Upstream could not be reached
    #[error("upstream unreachable: {0}")]
    Network(String),
}

impl HttpError for AssistantError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Config | Self::MalformedJson(_) | Self::EmptyContent => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            // Only error statuses are passed through, anything else is a gateway fault
            Self::UpstreamHttp { status, .. } if status.is_client_error() || status.is_server_error() => *status,
            Self::UpstreamHttp { .. } => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Config => "configuration_error",
            Self::InvalidInput(_) => "invalid_request_error",
            Self::UpstreamHttp { .. } => "upstream_error",
            Self::MalformedJson(_) => "malformed_upstream_response",
            Self::EmptyContent => "empty_content",
            Self::Timeout(_) => "upstream_timeout",
            Self::Network(_) => "network_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Config => "API key not configured".to_owned(),
            Self::InvalidInput(message) | Self::UpstreamHttp { message, .. } => message.clone(),
            Self::MalformedJson(_) => "Invalid response from AI service".to_owned(),
            Self::EmptyContent => "AI service returned no content".to_owned(),
            Self::Timeout(_) => "Request to AI service timed out".to_owned(),
            Self::Network(_) => "AI service unavailable".to_owned(),
        }
    }
}
