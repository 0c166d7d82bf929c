//! Router for the conversations API

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use super::public;
use crate::api::public::{ApiError, SuccessResponse};
use crate::api::state::AppState;

type SharedState = Arc<AppState>;

const NOT_FOUND: &str = "conversation not found";

/// List all conversations, most recently updated first
async fn conversation_list(
    State(state): State<SharedState>,
) -> Result<Json<Vec<public::ConversationSummary>>, ApiError> {
    let conversations = state.store.list().await?;
    Ok(Json(conversations))
}

/// Get a single conversation with all of its messages
async fn conversation_detail(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<public::Conversation>, ApiError> {
    state
        .store
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}

/// Delete a conversation and its messages
async fn conversation_delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if !state.store.delete(&id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    tracing::debug!("Deleted conversation {}", id);
    Ok(Json(SuccessResponse::ok()))
}

/// Create the conversations router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(conversation_list))
        .route("/{id}", get(conversation_detail).delete(conversation_delete))
}
