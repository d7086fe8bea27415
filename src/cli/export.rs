use std::path::Path;

use anyhow::{Context, Result};

use crate::api::public::conversations::{
    AllConversationsResponse, ConversationResponse, ConversationResult,
};
use crate::core::AppConfig;
use crate::twitter::{AuthData, DmClient};

pub async fn run(auth_path: &Path, conversation_id: Option<String>) -> Result<()> {
    let raw = tokio::fs::read_to_string(auth_path)
        .await
        .with_context(|| format!("Failed to read {}", auth_path.display()))?;
    let auth: AuthData = serde_json::from_str(&raw).context("Invalid auth file")?;

    let config = AppConfig::default();
    let client = DmClient::new(&auth, &config)?;

    let output = match conversation_id {
        Some(conversation_id) => {
            let messages = client.fetch_conversation(&conversation_id).await?;
            serde_json::to_string_pretty(&ConversationResponse {
                conversation_id,
                messages,
            })?
        }
        None => {
            let conversation_ids = client.conversation_ids().await?;
            let resp = if conversation_ids.is_empty() {
                AllConversationsResponse::empty()
            } else {
                AllConversationsResponse {
                    conversations: client
                        .fetch_conversations(&conversation_ids)
                        .await
                        .into_iter()
                        .map(ConversationResult::from)
                        .collect(),
                    message: None,
                }
            };
            serde_json::to_string_pretty(&resp)?
        }
    };
    println!("{}", output);

    Ok(())
}
