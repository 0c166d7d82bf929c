//! Router for the chat API

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    routing::post,
};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::chat::TurnRequest;

type SharedState = Arc<AppState>;

// Images arrive base64 encoded in the JSON body. Room for several
// images at the model API's 5 MB per image limit.
const MAX_BODY_BYTES: usize = 40 * 1024 * 1024;

/// Run one turn of a new or existing conversation
async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<public::ChatRequest>, JsonRejection>,
) -> Result<Json<public::ChatResponse>, ApiError> {
    let Json(payload) = payload.map_err(ApiError::from)?;

    let request = TurnRequest {
        message: payload
            .message
            .as_ref()
            .and_then(|m| m.as_str())
            .map(String::from),
        conversation_id: payload.conversation_id,
        images: payload.images.unwrap_or_default(),
    };
    let reply = state.chat.turn(request).await?;

    Ok(Json(public::ChatResponse {
        response: reply.reply,
        conversation_id: reply.conversation_id,
    }))
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
