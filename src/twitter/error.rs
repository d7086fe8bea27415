use http::StatusCode;
use thiserror::Error;

/// Failures the HTTP layer needs to tell apart from generic errors.
#[derive(Debug, Error)]
pub enum DmError {
    /// Upstream answered with something other than 200. Never retried.
    #[error("{}: {}", .status.as_u16(), .detail)]
    Upstream { status: StatusCode, detail: String },
    /// Credentials that can't be encoded as header values.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl DmError {
    pub fn status(&self) -> StatusCode {
        match self {
            DmError::Upstream { status, .. } => *status,
            DmError::InvalidCredentials(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            DmError::Upstream { detail, .. } => detail.clone(),
            DmError::InvalidCredentials(_) => self.to_string(),
        }
    }
}
