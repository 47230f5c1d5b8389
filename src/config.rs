use anyhow::{Context, Result};

/// Connection settings for the managed data backend.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Project base URL, without a trailing slash.
    pub backend_url: String,
    /// Publishable API key sent with every request.
    pub api_key: String,
    /// Refresh token from a previous session, exchanged once at startup.
    pub stored_refresh_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let backend_url = std::env::var("IDEABOX_BACKEND_URL")
            .context("IDEABOX_BACKEND_URL missing")?;
        let api_key = std::env::var("IDEABOX_API_KEY").context("IDEABOX_API_KEY missing")?;
        let stored_refresh_token = std::env::var("IDEABOX_REFRESH_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Ok(Self::new(backend_url, api_key, stored_refresh_token))
    }

    pub fn new(backend_url: String, api_key: String, stored_refresh_token: Option<String>) -> Self {
        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            api_key,
            stored_refresh_token,
        }
    }
}
