//! Conversation timelines and the concurrent fetch across many of them

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::inbox::{lenient, lenient_string, lenient_vec};
use super::paginate::{CycleGuard, Page, paginate};
use super::{DmClient, DmError};

#[derive(Debug, Default, Deserialize)]
pub struct ConversationResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub conversation_timeline: Option<ConversationTimeline>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversationTimeline {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub entries: Vec<ConversationEntry>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub min_entry_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversationEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<EntryMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryMessage {
    // Kept raw so an empty or odd-shaped payload is skipped instead of
    // failing the whole page
    #[serde(default)]
    pub message_data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recipient_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
}

/// A direct message flattened to what callers need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender_id: Option<String>,
    pub recipient_id: Option<String>,
    pub text: Option<String>,
    pub timestamp: Option<String>,
}

impl From<MessageData> for Message {
    fn from(data: MessageData) -> Self {
        Self {
            timestamp: epoch_millis_to_iso(data.time.as_deref()),
            sender_id: data.sender_id,
            recipient_id: data.recipient_id,
            text: data.text,
        }
    }
}

/// Convert epoch milliseconds to an RFC 3339 UTC timestamp.
///
/// Returns `None` for a missing or unparseable value. Zero is a valid
/// time and converts to the epoch.
pub fn epoch_millis_to_iso(time: Option<&str>) -> Option<String> {
    let millis: i64 = time?.trim().parse().ok()?;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn simplify(message_data: Value) -> Option<Message> {
    match message_data {
        Value::Object(map) if !map.is_empty() => {
            serde_json::from_value::<MessageData>(Value::Object(map))
                .ok()
                .map(Message::from)
        }
        _ => None,
    }
}

impl ConversationResponse {
    fn into_page(self) -> Page<Message> {
        let timeline = self.conversation_timeline.unwrap_or_default();
        let items = timeline
            .entries
            .into_iter()
            .filter_map(|entry| entry.message?.message_data)
            .filter_map(simplify)
            .collect();
        Page {
            items,
            status: timeline.status,
            cursor: timeline.min_entry_id,
        }
    }
}

/// Outcome of fetching one conversation as part of a batch.
#[derive(Debug)]
pub struct ConversationOutcome {
    pub conversation_id: String,
    pub messages: Result<Vec<Message>>,
}

impl DmClient {
    async fn conversation_page(
        &self,
        conversation_id: &str,
        max_id: Option<String>,
        page_number: usize,
    ) -> Result<Page<Message>> {
        let res = self
            .get_conversation(conversation_id, max_id.as_deref())
            .await?;
        if res.status != StatusCode::OK {
            tracing::debug!(
                "Conversation {} page {} failed: {} ({})",
                conversation_id,
                page_number,
                res.status,
                res.body
            );
            return Err(DmError::Upstream {
                status: res.status,
                detail: format!("Error fetching page {}", page_number),
            }
            .into());
        }
        let conversation: ConversationResponse = res.json()?;
        Ok(conversation.into_page())
    }

    /// Every message in a conversation, newest page first.
    ///
    /// Follows `min_entry_id` as `max_id` until the timeline reports
    /// `AT_END`, stops handing out cursors or repeats one it already
    /// gave during this run.
    pub async fn fetch_conversation(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let mut guard = CycleGuard::new();
        paginate(
            move |max_id, page_number| self.conversation_page(conversation_id, max_id, page_number),
            |page| guard.should_stop(page),
        )
        .await
    }

    /// Fetch every conversation concurrently.
    ///
    /// All fetches run to completion: a failure is kept in that
    /// conversation's outcome and never cancels the others. Outcomes
    /// come back in the same order as `conversation_ids`.
    pub async fn fetch_conversations(&self, conversation_ids: &[String]) -> Vec<ConversationOutcome> {
        let fetches = conversation_ids.iter().map(move |conversation_id| async move {
            let messages = self.fetch_conversation(conversation_id).await;
            match &messages {
                Ok(messages) => tracing::info!(
                    "Fetched {} messages from conversation {}",
                    messages.len(),
                    conversation_id
                ),
                Err(err) => tracing::warn!(
                    "Failed to fetch conversation {}: {:#}",
                    conversation_id,
                    err
                ),
            }
            ConversationOutcome {
                conversation_id: conversation_id.clone(),
                messages,
            }
        });
        let outcomes = join_all(fetches).await;

        let succeeded = outcomes.iter().filter(|o| o.messages.is_ok()).count();
        tracing::info!(
            "Fetched {} of {} conversations",
            succeeded,
            conversation_ids.len()
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AppConfig;
    use crate::twitter::AuthData;
    use serde_json::json;

    fn test_client(base_url: &str) -> DmClient {
        let config = AppConfig {
            inbox_base_url: base_url.to_string(),
            api_base_url: base_url.to_string(),
            user_agent: String::from("Mozilla/5.0"),
            client_language: String::from("en"),
            request_timeout_secs: 5,
        };
        let auth = AuthData {
            cookies: [("ct0", "csrf")].into_iter().collect(),
            bearer_token: String::from("Bearer AAAA"),
        };
        DmClient::new(&auth, &config).unwrap()
    }

    fn conversation_page(texts: &[&str], status: Option<&str>, cursor: Option<&str>) -> String {
        let entries: Vec<_> = texts
            .iter()
            .map(|text| {
                json!({"message": {"message_data": {
                    "sender_id": "1",
                    "recipient_id": "2",
                    "text": text,
                    "time": "1700000000000",
                }}})
            })
            .collect();
        json!({
            "conversation_timeline": {
                "entries": entries,
                "status": status,
                "min_entry_id": cursor,
            }
        })
        .to_string()
    }

    #[test]
    fn test_epoch_millis_to_iso() {
        assert_eq!(
            epoch_millis_to_iso(Some("0")).as_deref(),
            Some("1970-01-01T00:00:00.000Z")
        );
        assert_eq!(
            epoch_millis_to_iso(Some("1700000000123")).as_deref(),
            Some("2023-11-14T22:13:20.123Z")
        );
        assert_eq!(epoch_millis_to_iso(None), None);
        assert_eq!(epoch_millis_to_iso(Some("")), None);
        assert_eq!(epoch_millis_to_iso(Some("yesterday")), None);
    }

    #[test]
    fn test_into_page_flattens_messages() {
        let conversation: ConversationResponse = serde_json::from_value(json!({
            "conversation_timeline": {
                "status": "HAS_MORE",
                "min_entry_id": "900",
                "entries": [
                    {"message": {"message_data": {
                        "sender_id": "11", "recipient_id": "22", "text": "hi", "time": 0
                    }}},
                    {"message": {"message_data": {"text": "no time"}}},
                    {"message": {"message_data": {}}},
                    {"message": {"id": "no data"}},
                    {"join_conversation": {"id": "j1"}},
                ]
            }
        }))
        .unwrap();
        let page = conversation.into_page();
        assert_eq!(page.status.as_deref(), Some("HAS_MORE"));
        assert_eq!(page.cursor.as_deref(), Some("900"));
        assert_eq!(
            page.items,
            vec![
                Message {
                    sender_id: Some("11".to_string()),
                    recipient_id: Some("22".to_string()),
                    text: Some("hi".to_string()),
                    timestamp: Some("1970-01-01T00:00:00.000Z".to_string()),
                },
                Message {
                    sender_id: None,
                    recipient_id: None,
                    text: Some("no time".to_string()),
                    timestamp: None,
                },
            ]
        );
    }

    #[test]
    fn test_into_page_without_timeline() {
        let conversation: ConversationResponse = serde_json::from_str("{}").unwrap();
        let page = conversation.into_page();
        assert!(page.items.is_empty());
        assert!(page.cursor.is_none());
    }

    #[test]
    fn test_into_page_with_unexpected_container_types() {
        let conversation: ConversationResponse = serde_json::from_value(json!({
            "conversation_timeline": {
                "status": "AT_END",
                "entries": [
                    42,
                    {"message": ["not", "an", "object"]},
                    {"message": {"message_data": {"text": "kept"}}},
                ]
            }
        }))
        .unwrap();
        let page = conversation.into_page();
        assert!(page.is_at_end());
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].text.as_deref(), Some("kept"));

        let conversation: ConversationResponse =
            serde_json::from_value(json!({"conversation_timeline": {"entries": {}}})).unwrap();
        assert!(conversation.into_page().items.is_empty());

        let conversation: ConversationResponse =
            serde_json::from_value(json!({"conversation_timeline": "x"})).unwrap();
        assert!(conversation.conversation_timeline.is_none());
    }

    #[tokio::test]
    async fn test_fetch_conversation_follows_max_id() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/i/api/1.1/dm/conversation/1-2.json")
            .with_status(200)
            .with_body(conversation_page(&["c", "b"], Some("HAS_MORE"), Some("50")))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/i/api/1.1/dm/conversation/1-2.json?max_id=50")
            .with_status(200)
            .with_body(conversation_page(&["a"], Some("AT_END"), Some("10")))
            .expect(1)
            .create_async()
            .await;

        let messages = test_client(&server.url())
            .fetch_conversation("1-2")
            .await
            .unwrap();
        let texts: Vec<_> = messages.iter().filter_map(|m| m.text.as_deref()).collect();
        assert_eq!(texts, vec!["c", "b", "a"]);
        assert_eq!(
            messages[0].timestamp.as_deref(),
            Some("2023-11-14T22:13:20.000Z")
        );
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_conversation_stops_on_repeated_cursor() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/i/api/1.1/dm/conversation/7.json")
            .with_status(200)
            .with_body(conversation_page(&["one"], None, Some("50")))
            .expect(1)
            .create_async()
            .await;
        // Upstream keeps answering with the same cursor
        let repeated = server
            .mock("GET", "/i/api/1.1/dm/conversation/7.json?max_id=50")
            .with_status(200)
            .with_body(conversation_page(&["two"], None, Some("50")))
            .expect(1)
            .create_async()
            .await;

        let messages = test_client(&server.url())
            .fetch_conversation("7")
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        first.assert_async().await;
        repeated.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_conversation_reports_failing_page() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("GET", "/i/api/1.1/dm/conversation/7.json")
            .with_status(200)
            .with_body(conversation_page(&["one"], None, Some("50")))
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/i/api/1.1/dm/conversation/7.json?max_id=50")
            .with_status(404)
            .with_body("gone")
            .create_async()
            .await;

        let err = test_client(&server.url())
            .fetch_conversation("7")
            .await
            .unwrap_err();
        let err = err.downcast_ref::<DmError>().unwrap();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.detail(), "Error fetching page 1");
    }

    #[tokio::test]
    async fn test_fetch_conversations_isolates_failures() {
        let mut server = mockito::Server::new_async().await;
        let _a = server
            .mock("GET", "/i/api/1.1/dm/conversation/A.json")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let _b = server
            .mock("GET", "/i/api/1.1/dm/conversation/B.json")
            .with_status(200)
            .with_body(conversation_page(&["x", "y"], Some("AT_END"), None))
            .create_async()
            .await;

        let ids = vec!["A".to_string(), "B".to_string()];
        let outcomes = test_client(&server.url()).fetch_conversations(&ids).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].conversation_id, "A");
        let err = outcomes[0].messages.as_ref().unwrap_err();
        assert_eq!(err.to_string(), "500: Error fetching page 0");
        assert_eq!(outcomes[1].conversation_id, "B");
        assert_eq!(outcomes[1].messages.as_ref().unwrap().len(), 2);
    }
}
