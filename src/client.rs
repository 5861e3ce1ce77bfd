//! HTTP client for the brokerage REST API.
//!
//! [`RestClient`] wraps [`reqwest::Client`] with JSON default headers and
//! provides a typed `get` with query parameters. Chart snapshot endpoints are
//! added to it via `impl` blocks in [`crate::api`].

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{FeedConfig, join_path};
use crate::constants::API_BASE_URL;
use crate::error::{ApiErrorBody, FeedError, Result};

/// HTTP client for the REST API.
///
/// # Example
///
/// ```no_run
/// use hana_feed::client::RestClient;
/// use hana_feed::types::ChartPeriod;
///
/// # #[tokio::main]
/// # async fn main() -> hana_feed::Result<()> {
/// let client = RestClient::new()?;
/// let chart = client.period_chart("005930", ChartPeriod::Week).await?;
/// println!("{} candles", chart.chart_data.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    /// Base URL for REST requests (defaults to [`API_BASE_URL`]).
    base_url: String,
}

impl RestClient {
    /// Create a client for the default base URL (`http://localhost:8080`).
    pub fn new() -> Result<Self> {
        Self::with_base_url(API_BASE_URL)
    }

    /// Create a client for the configured API base URL.
    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Self::with_base_url(config.api_base_url.as_str())
    }

    /// Create a client pointing at a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Returns a reference to the underlying `reqwest::Client`.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Generic HTTP helpers
    // -----------------------------------------------------------------------

    /// Perform a GET request with query parameters and deserialize the JSON
    /// response.
    pub async fn get<Q, R>(&self, path: &str, query: &Q) -> Result<R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = join_path(&self.base_url, path)?;
        tracing::debug!(%url, "GET");

        let resp = self.http.get(&url).query(query).send().await?;
        self.handle_response(resp).await
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Default headers applied to every request.
    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Read a response, returning either the deserialized body or a
    /// `FeedError`.
    async fn handle_response<R: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<R> {
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(FeedError::Json)
        } else {
            let body = String::from_utf8_lossy(&bytes);
            Err(parse_error_body(status, &body))
        }
    }
}

/// Try to parse the backend's JSON error structure; fall back to a raw HTTP
/// status error.
pub(crate) fn parse_error_body(status: reqwest::StatusCode, body: &str) -> FeedError {
    if let Ok(api_err) = serde_json::from_str::<ApiErrorBody>(body) {
        if api_err.error_code.is_some() || api_err.message.is_some() {
            return FeedError::Api(api_err);
        }
    }
    FeedError::HttpStatus {
        status,
        body: body.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn structured_error_bodies_become_api_errors() {
        let err = parse_error_body(
            StatusCode::BAD_REQUEST,
            r#"{"success":false,"errorCode":"STOCK_NOT_FOUND","message":"unknown code"}"#,
        );
        match err {
            FeedError::Api(body) => {
                assert_eq!(body.error_code.as_deref(), Some("STOCK_NOT_FOUND"));
                assert_eq!(body.to_string(), "[STOCK_NOT_FOUND] unknown code");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_bodies_keep_the_status() {
        let err = parse_error_body(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert!(matches!(
            err,
            FeedError::HttpStatus { status, .. } if status == StatusCode::BAD_GATEWAY
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = RestClient::with_base_url("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
