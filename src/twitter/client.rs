use std::time::Duration;

use anyhow::Result;
use http::StatusCode;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::auth::{AuthData, build_headers};
use crate::core::AppConfig;

const INBOX_PATH: &str = "/i/api/1.1/dm/inbox_initial_state";
const CONVERSATION_PATH: &str = "/i/api/1.1/dm/conversation";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the DM API, authenticated as one caller.
///
/// Built once per inbound request. The header set and connection pool
/// are shared by every call made through it, including each task of a
/// concurrent conversation fetch.
#[derive(Clone, Debug)]
pub struct DmClient {
    http: Client,
    inbox_url: String,
    api_base_url: String,
}

/// Raw upstream reply, read fully so the status can be checked first.
pub(crate) struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

impl DmClient {
    pub fn new(auth: &AuthData, config: &AppConfig) -> Result<Self> {
        let headers = build_headers(auth, config)?;
        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            inbox_url: format!("{}{}", config.inbox_base_url.trim_end_matches('/'), INBOX_PATH),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn conversation_url(&self, conversation_id: &str) -> String {
        format!(
            "{}{}/{}.json",
            self.api_base_url,
            CONVERSATION_PATH,
            urlencoding::encode(conversation_id)
        )
    }

    /// GET the inbox, optionally continuing from `cursor`.
    pub(crate) async fn get_inbox(&self, cursor: Option<&str>) -> Result<UpstreamResponse> {
        let mut req = self.http.get(&self.inbox_url);
        if let Some(cursor) = cursor {
            req = req.query(&[("cursor", cursor)]);
        }
        self.send(req).await
    }

    /// GET one page of a conversation, optionally older than `max_id`.
    pub(crate) async fn get_conversation(
        &self,
        conversation_id: &str,
        max_id: Option<&str>,
    ) -> Result<UpstreamResponse> {
        let mut req = self.http.get(self.conversation_url(conversation_id));
        if let Some(max_id) = max_id {
            req = req.query(&[("max_id", max_id)]);
        }
        self.send(req).await
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<UpstreamResponse> {
        let res = req.send().await?;
        let status = res.status();
        let body = res.text().await?;
        Ok(UpstreamResponse { status, body })
    }
}
