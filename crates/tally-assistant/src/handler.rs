//! HTTP endpoints for chat and image solving

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use tally_core::HttpError;

use crate::error::AssistantError;
use crate::state::{AssistantState, INVALID_MESSAGES};
use crate::types::{ChatRequest, NormalizedReply, SolveReply};

/// Multipart framing allowance on top of the image itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

const NO_IMAGE: &str = "No image provided";

/// Router serving `/api/chat` and `/api/solve`
pub fn assistant_router(state: AssistantState) -> Router {
    let body_limit = state.max_image_bytes().saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/solve", post(solve).layer(DefaultBodyLimit::max(body_limit)))
        .with_state(state)
}

async fn chat(
    State(state): State<AssistantState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<NormalizedReply>, AssistantError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "rejected chat body");
        AssistantError::InvalidInput(INVALID_MESSAGES.to_owned())
    })?;

    tracing::debug!(messages = request.messages.len(), "chat request");

    let reply = state.chat(request.messages).await?;
    Ok(Json(reply))
}

async fn solve(
    State(state): State<AssistantState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SolveReply>, AssistantError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "rejected solve body");
        AssistantError::InvalidInput(NO_IMAGE.to_owned())
    })?;

    let (bytes, mime) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AssistantError::InvalidInput(format!("Failed to read upload: {}", e.body_text())))?;

        let Some(field) = field else {
            return Err(AssistantError::InvalidInput(NO_IMAGE.to_owned()));
        };

        if field.name() != Some("image") {
            continue;
        }

        let mime = field.content_type().unwrap_or("image/png").to_owned();
        if !mime.starts_with("image/") {
            return Err(AssistantError::InvalidInput("Unsupported image type".to_owned()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AssistantError::InvalidInput(format!("Failed to read image: {}", e.body_text())))?;

        break (bytes, mime);
    };

    if bytes.len() > state.max_image_bytes() {
        return Err(AssistantError::InvalidInput("Image too large".to_owned()));
    }

    tracing::debug!(bytes = bytes.len(), %mime, "solve request");

    let result = state.solve(&bytes, &mime).await?;
    Ok(Json(SolveReply { result }))
}

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, error_type = self.error_type(), "assistant request failed");
        } else {
            tracing::warn!(error = %self, error_type = self.error_type(), "assistant request rejected");
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
