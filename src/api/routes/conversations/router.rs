//! Router for the conversations API

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::post,
};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::twitter::DmClient;

type SharedState = Arc<AppState>;

/// Get every message in a single conversation
async fn fetch_dm_conversation(
    State(state): State<SharedState>,
    Path(conversation_id): Path<String>,
    Json(auth): Json<public::AuthData>,
) -> Result<Json<public::ConversationResponse>, ApiError> {
    let client = DmClient::new(&auth, &state.config)?;
    let messages = client.fetch_conversation(&conversation_id).await?;

    Ok(Json(public::ConversationResponse {
        conversation_id,
        messages,
    }))
}

/// Get every message in every conversation of the inbox. A
/// conversation that fails is reported with an `error` instead of
/// failing the whole request.
async fn fetch_all_conversations(
    State(state): State<SharedState>,
    Json(auth): Json<public::AuthData>,
) -> Result<Json<public::AllConversationsResponse>, ApiError> {
    let client = DmClient::new(&auth, &state.config)?;
    let conversation_ids = client.conversation_ids().await?;

    if conversation_ids.is_empty() {
        return Ok(Json(public::AllConversationsResponse::empty()));
    }

    let conversations = client
        .fetch_conversations(&conversation_ids)
        .await
        .into_iter()
        .map(public::ConversationResult::from)
        .collect();

    Ok(Json(public::AllConversationsResponse {
        conversations,
        message: None,
    }))
}

/// Create the conversations router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/fetch_dm/{conversation_id}", post(fetch_dm_conversation))
        .route("/fetch_all_conversations", post(fetch_all_conversations))
}
