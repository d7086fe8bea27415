//! Client for the private direct message API
//!
//! Everything here runs within the lifetime of a single inbound
//! request: build a [`DmClient`] from the caller's credentials, page
//! through the inbox or a conversation and hand back flattened
//! records.

pub mod auth;
mod client;
pub mod conversation;
mod error;
pub mod inbox;
pub mod paginate;

pub use auth::{AuthData, CookieJar, build_headers, format_cookie_header};
pub use client::DmClient;
pub use conversation::{ConversationOutcome, Message};
pub use error::DmError;
pub use inbox::UserMetadata;
