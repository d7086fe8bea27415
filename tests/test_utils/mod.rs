//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use dmrelay::api::AppState;
use dmrelay::api::app;
use dmrelay::core::AppConfig;

pub const INBOX_PATH: &str = "/i/api/1.1/dm/inbox_initial_state";

pub fn test_config(inbox_url: &str, api_url: &str, request_timeout_secs: u64) -> AppConfig {
    AppConfig {
        inbox_base_url: inbox_url.to_string(),
        api_base_url: api_url.to_string(),
        user_agent: String::from("Mozilla/5.0"),
        client_language: String::from("en"),
        request_timeout_secs,
    }
}

/// Creates a test application router whose upstream calls all go to
/// `upstream_url`, usually a `mockito` server.
pub fn test_app(upstream_url: &str) -> Router {
    test_app_with_config(test_config(upstream_url, upstream_url, 5))
}

pub fn test_app_with_config(app_config: AppConfig) -> Router {
    app(Arc::new(AppState::new(app_config)))
}

/// Starts an upstream that answers every request with a 200 status line
/// and the start of a body, then never sends the rest. Returns its base
/// URL.
pub async fn stalling_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"inbox",
                    )
                    .await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });
    format!("http://{}", addr)
}

/// Request body with a minimal set of session cookies
pub fn auth_body() -> Body {
    Body::from(
        json!({
            "cookies": {"auth_token": "abc", "ct0": "csrf"},
            "bearer_token": "Bearer AAAA",
        })
        .to_string(),
    )
}

pub fn post(uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

pub async fn body_to_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Inbox payload with one entry per conversation ID
pub fn inbox_page(ids: &[&str], status: Option<&str>, cursor: Option<&str>) -> String {
    let entries: Vec<_> = ids
        .iter()
        .map(|id| json!({"message": {"conversation_id": id}}))
        .collect();
    json!({
        "inbox_initial_state": {"entries": entries},
        "inbox_timelines": {"trusted": {"status": status, "min_entry_id": cursor}},
    })
    .to_string()
}

/// Conversation payload with one message per text
pub fn conversation_page(texts: &[&str], status: Option<&str>, cursor: Option<&str>) -> String {
    let entries: Vec<_> = texts
        .iter()
        .map(|text| {
            json!({"message": {"message_data": {
                "sender_id": "111",
                "recipient_id": "222",
                "text": text,
                "time": "0",
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
