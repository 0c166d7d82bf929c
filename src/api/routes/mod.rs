//! API routes module

pub mod auth;
pub mod chat;
pub mod conversations;

use std::sync::Arc;

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<AppState>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Chat turns
        .nest("/chat", chat::router())
        // Conversation history
        .nest("/conversations", conversations::router())
        // Password check that sets the session cookie
        .nest("/auth", auth::router())
}
