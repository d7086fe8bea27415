//! API routes module

pub mod conversations;
pub mod inbox;

use std::sync::Arc;

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<AppState>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Inbox routes
        .merge(inbox::router())
        // Conversation routes
        .merge(conversations::router())
}
