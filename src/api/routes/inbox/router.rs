//! Router for the inbox API

use std::sync::Arc;

use axum::{Router, extract::State, response::Json, routing::post};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::twitter::DmClient;

type SharedState = Arc<AppState>;

/// List the ID of every conversation in the inbox
async fn fetch_initial_state(
    State(state): State<SharedState>,
    Json(auth): Json<public::AuthData>,
) -> Result<Json<public::InitialStateResponse>, ApiError> {
    let client = DmClient::new(&auth, &state.config)?;
    let conversation_ids = client.conversation_ids().await?;

    Ok(Json(public::InitialStateResponse {
        total: conversation_ids.len(),
        conversation_ids,
    }))
}

/// Name and screen name of everyone in the inbox
async fn fetch_users_metadata(
    State(state): State<SharedState>,
    Json(auth): Json<public::AuthData>,
) -> Result<Json<public::UsersMetadataResponse>, ApiError> {
    let client = DmClient::new(&auth, &state.config)?;
    let users = client.users_metadata().await?;

    Ok(Json(public::UsersMetadataResponse {
        user_count: users.len(),
        users,
    }))
}

/// Create the inbox router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/fetch-initial-state", post(fetch_initial_state))
        .route("/fetch_users_metadata", post(fetch_users_metadata))
}
