//! Public types for the conversations API
use serde::{Deserialize, Serialize};

pub use crate::twitter::{AuthData, Message};
use crate::twitter::ConversationOutcome;

pub const NO_CONVERSATIONS_FOUND: &str = "No conversations found";

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub messages: Vec<Message>,
}

/// One conversation of a batch fetch. `error` is only present when
/// that conversation failed, in which case `messages` is empty.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResult {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ConversationOutcome> for ConversationResult {
    fn from(outcome: ConversationOutcome) -> Self {
        let ConversationOutcome {
            conversation_id,
            messages,
        } = outcome;
        match messages {
            Ok(messages) => Self {
                conversation_id,
                messages,
                error: None,
            },
            Err(err) => Self {
                conversation_id,
                messages: Vec::new(),
                error: Some(format!("{:#}", err)),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllConversationsResponse {
    pub conversations: Vec<ConversationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AllConversationsResponse {
    pub fn empty() -> Self {
        Self {
            conversations: Vec::new(),
            message: Some(NO_CONVERSATIONS_FOUND.to_string()),
        }
    }
}
