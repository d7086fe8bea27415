use crate::core::AppConfig;

/// Immutable for the life of the server. Credentials arrive with each
/// request and are never stored here.
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}
