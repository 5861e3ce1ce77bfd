//! Error types for the `hana-feed` crate.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, FeedError>`.
//!
//! [`FeedError`] covers:
//! - **API errors**: Structured error bodies returned by the backend
//! - **HTTP status errors**: Unexpected status codes with response body
//! - **HTTP transport errors**: Network, TLS, timeout failures
//! - **JSON errors**: Serialization and deserialization failures
//! - **WebSocket errors**: Handshake and protocol errors
//! - **URL errors**: Malformed base URLs or endpoint joins
//! - **Configuration errors**: Invalid environment overrides
//! - **Connect errors**: A failed stream connection attempt
//! - **Disconnected**: A pending `connect()` aborted by `disconnect()`

use std::fmt;

/// Error body returned by the brokerage backend on a failed request.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Whether the backend reported success (always `false` here).
    #[serde(default)]
    pub success: Option<bool>,
    /// Backend error code, when one is attached.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Human-readable description of the error.
    #[serde(default)]
    pub message: Option<String>,
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.error_code.as_deref().unwrap_or("UNKNOWN"),
            self.message.as_deref().unwrap_or("No message"),
        )
    }
}

/// All possible errors produced by `hana-feed`.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// An error body returned by the REST API.
    #[error("API error: {0}")]
    Api(ApiErrorBody),

    /// The server returned an unexpected HTTP status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// The response body text.
        body: String,
    },

    /// A network or transport-level error from `reqwest`.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to serialize or deserialize JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A WebSocket-level error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An error building or parsing a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The caller provided an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A WebSocket connection attempt failed.
    #[error("WebSocket connection failed: {0}")]
    Connect(String),

    /// The stream was disconnected while a connection attempt was pending.
    #[error("stream disconnected")]
    Disconnected,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FeedError>;
