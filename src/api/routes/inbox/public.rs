//! Public types for the inbox API
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use crate::twitter::{AuthData, UserMetadata};

#[derive(Debug, Serialize, Deserialize)]
pub struct InitialStateResponse {
    pub conversation_ids: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersMetadataResponse {
    pub user_count: usize,
    pub users: BTreeMap<String, UserMetadata>,
}
