use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub inbox_base_url: String,
    pub api_base_url: String,
    pub user_agent: String,
    pub client_language: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        // The inbox is still served from the old domain
        let inbox_base_url = env::var("DMRELAY_INBOX_BASE_URL")
            .unwrap_or_else(|_| "https://twitter.com".to_string());
        let api_base_url =
            env::var("DMRELAY_API_BASE_URL").unwrap_or_else(|_| "https://x.com".to_string());
        let user_agent =
            env::var("DMRELAY_USER_AGENT").unwrap_or_else(|_| "Mozilla/5.0".to_string());
        let client_language =
            env::var("DMRELAY_CLIENT_LANGUAGE").unwrap_or_else(|_| "en".to_string());
        let request_timeout_secs = env::var("DMRELAY_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse().ok())
            .unwrap_or(30);

        Self {
            inbox_base_url,
            api_base_url,
            user_agent,
            client_language,
            request_timeout_secs,
        }
    }
}
