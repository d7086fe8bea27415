//! Inbox initial state: conversation IDs and user records

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use http::StatusCode;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::paginate::{Page, at_end_or_exhausted, paginate};
use super::{DmClient, DmError};

/// Deserialize a string-ish field, treating anything else as absent.
/// IDs and timestamps show up both as strings and as numbers.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Deserialize a nested object, falling back to the default when the
/// value has an unexpected shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Deserialize a list, dropping elements that don't parse. Anything
/// other than an array is an empty list.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct InboxResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub inbox_initial_state: Option<InboxState>,
    #[serde(default, deserialize_with = "lenient")]
    pub inbox_timelines: Option<InboxTimelines>,
    #[serde(default, deserialize_with = "lenient")]
    pub users: Option<HashMap<String, RawUser>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InboxState {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub entries: Vec<InboxEntry>,
    #[serde(default, deserialize_with = "lenient")]
    pub users: Option<HashMap<String, RawUser>>,
    #[serde(default, deserialize_with = "lenient")]
    pub inbox_timelines: Option<InboxTimelines>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InboxEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<InboxMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InboxMessage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InboxTimelines {
    #[serde(default, deserialize_with = "lenient")]
    pub trusted: Option<Timeline>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Timeline {
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub min_entry_id: Option<String>,
}

/// The parts of a user record the API cares about. Everything else in
/// the upstream payload is dropped.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub screen_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    pub name: String,
    pub screen_name: String,
}

impl From<RawUser> for UserMetadata {
    fn from(user: RawUser) -> Self {
        Self {
            name: user.name.unwrap_or_default(),
            screen_name: user.screen_name.unwrap_or_default(),
        }
    }
}

impl InboxResponse {
    /// Conversation IDs in page order, duplicates included.
    pub fn conversation_ids(&self) -> Vec<String> {
        self.inbox_initial_state
            .iter()
            .flat_map(|state| state.entries.iter())
            .filter_map(|entry| entry.message.as_ref()?.conversation_id.clone())
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Users from the initial state, or from the root when the payload
    /// isn't wrapped.
    pub fn take_users(&mut self) -> HashMap<String, RawUser> {
        match self.inbox_initial_state.as_mut() {
            Some(state) => state.users.take(),
            None => self.users.take(),
        }
        .unwrap_or_default()
    }

    /// The trusted timeline carries the pagination state. Some payloads
    /// nest it inside the initial state.
    fn trusted_timeline(&self) -> Option<&Timeline> {
        self.inbox_timelines
            .as_ref()
            .or_else(|| self.inbox_initial_state.as_ref()?.inbox_timelines.as_ref())
            .and_then(|timelines| timelines.trusted.as_ref())
    }

    fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        let (status, cursor) = self
            .trusted_timeline()
            .map(|t| (t.status.clone(), t.min_entry_id.clone()))
            .unwrap_or_default();
        Page {
            items,
            status,
            cursor,
        }
    }
}

/// Reduce raw user records to name and screen name.
pub fn extract_users_metadata<I>(users: I) -> BTreeMap<String, UserMetadata>
where
    I: IntoIterator<Item = (String, RawUser)>,
{
    users
        .into_iter()
        .map(|(id, user)| (id, UserMetadata::from(user)))
        .collect()
}

impl DmClient {
    async fn inbox_page(&self, cursor: Option<String>) -> Result<InboxResponse> {
        let res = self.get_inbox(cursor.as_deref()).await?;
        if res.status != StatusCode::OK {
            tracing::warn!("Inbox fetch failed: {}", res.status);
            return Err(DmError::Upstream {
                status: res.status,
                detail: res.body,
            }
            .into());
        }
        res.json()
    }

    async fn conversation_ids_page(&self, cursor: Option<String>) -> Result<Page<String>> {
        let inbox = self.inbox_page(cursor).await?;
        let ids = inbox.conversation_ids();
        Ok(inbox.into_page(ids))
    }

    async fn users_page(&self, cursor: Option<String>) -> Result<Page<(String, RawUser)>> {
        let mut inbox = self.inbox_page(cursor).await?;
        let users = inbox.take_users().into_iter().collect();
        Ok(inbox.into_page(users))
    }

    /// Every conversation ID in the inbox, each exactly once, in the
    /// order first seen.
    pub async fn conversation_ids(&self) -> Result<Vec<String>> {
        let ids = paginate(
            move |cursor, _| self.conversation_ids_page(cursor),
            at_end_or_exhausted,
        )
        .await?;

        let ids: Vec<String> = ids.into_iter().unique().collect();
        tracing::info!("Found {} conversations", ids.len());
        Ok(ids)
    }

    /// Name and screen name of every user in the inbox. A user seen on
    /// more than one page keeps the record from the latest page.
    pub async fn users_metadata(&self) -> Result<BTreeMap<String, UserMetadata>> {
        let users = paginate(move |cursor, _| self.users_page(cursor), at_end_or_exhausted).await?;

        let users = extract_users_metadata(users);
        tracing::info!("Found {} users", users.len());
        Ok(users)
    }
}
