//! Endpoint configuration loaded from environment variables.
//!
//! - `HANA_API_BASE_URL`: REST base URL (default `http://localhost:8080`)
//! - `HANA_WS_BASE_URL`: WebSocket base URL (default `ws://localhost:8080`)
//!
//! Empty variables are treated as unset.

use url::Url;

use crate::constants::{API_BASE_URL, WS_BASE_URL};
use crate::error::{FeedError, Result};

/// Base URLs for the REST API and the WebSocket streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub api_base_url: String,
    pub ws_base_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base_url: API_BASE_URL.to_owned(),
            ws_base_url: WS_BASE_URL.to_owned(),
        }
    }
}

impl FeedConfig {
    /// Load the configuration from the environment, falling back to the
    /// localhost defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] if an override is not a valid URL or the
    /// WebSocket URL does not use `ws`/`wss`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            non_empty_var("HANA_API_BASE_URL"),
            non_empty_var("HANA_WS_BASE_URL"),
        )
    }

    fn from_vars(api: Option<String>, ws: Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            api_base_url: api.unwrap_or(defaults.api_base_url),
            ws_base_url: ws.unwrap_or(defaults.ws_base_url),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that both base URLs parse and use a matching scheme.
    pub fn validate(&self) -> Result<()> {
        let api = Url::parse(&self.api_base_url)
            .map_err(|e| FeedError::Config(format!("invalid API base URL: {e}")))?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(FeedError::Config(format!(
                "API base URL must be http(s), got {}",
                api.scheme()
            )));
        }

        let ws = Url::parse(&self.ws_base_url)
            .map_err(|e| FeedError::Config(format!("invalid WebSocket base URL: {e}")))?;
        if !matches!(ws.scheme(), "ws" | "wss") {
            return Err(FeedError::Config(format!(
                "WebSocket base URL must be ws(s), got {}",
                ws.scheme()
            )));
        }
        Ok(())
    }

    /// Full WebSocket URL for an endpoint path such as `/ws/trade`.
    pub fn ws_url(&self, path: &str) -> Result<String> {
        join_path(&self.ws_base_url, path)
    }
}

/// Join `path` onto `base`, keeping any path prefix the base already has.
pub(crate) fn join_path(base: &str, path: &str) -> Result<String> {
    let mut url = Url::parse(base)?;
    let joined = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    Ok(url.to_string())
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
