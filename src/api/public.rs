//! Public API types

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

use crate::twitter::DmError;

// Errors

pub struct ApiError(anyhow::Error);

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        if let Some(err) = self.0.downcast_ref::<DmError>() {
            return (err.status(), err.detail());
        }
        let timed_out = self
            .0
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|err| err.is_timeout());
        if timed_out {
            return (
                StatusCode::GATEWAY_TIMEOUT,
                format!("Upstream request timed out: {}", self.0),
            );
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {}", self.0),
        )
    }
}

/// Convert `ApiError` into an Axum compatible response.
///
/// Upstream failures keep the upstream status code so callers can
/// tell an expired session (401) from a bad conversation ID (404).
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Always log the error
        tracing::error!("{:#}", self.0);

        let (status, detail) = self.status_and_detail();
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod conversations {
    pub use crate::api::routes::conversations::public::*;
}

pub mod inbox {
    pub use crate::api::routes::inbox::public::*;
}
