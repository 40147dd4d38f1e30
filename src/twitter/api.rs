//! Transport to the Twitter/X API v2.
//!
//! [`SearchTransport`] is the seam between the search logic and HTTP.
//! [`HttpTransport`] implements it with `reqwest` and a bearer token.

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use log::{debug, error, info};
use reqwest::Client;
use std::io;
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;

use super::wire::RecentSearchBody;
use crate::config::AppConfig;
use crate::error::TransportError;

/// A blocking-style line source for the filtered stream.
pub type LineSource = Box<dyn AsyncBufRead + Send + Unpin>;

const RECENT_SEARCH_FIELDS: &str = "max_results=100&sort_order=recency&expansions=author_id&tweet.fields=created_at,author_id&user.fields=created_at,name,username";
const STREAM_FIELDS: &str = "expansions=author_id&tweet.fields=id,created_at,text,author_id&user.fields=id,created_at,name,username";

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// Newlines and tabs become spaces, other control characters become `?`,
/// and text longer than `max_len` bytes is cut at a character boundary.
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.len() > max_len {
        let mut cut = max_len;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... [truncated, {} total bytes]",
            &sanitized[..cut],
            text.len()
        )
    } else {
        sanitized
    }
}

/// Builds the Authorization header for OAuth 2.0 Bearer Token authentication.
///
/// ```rust
/// use tweetfeed::twitter::build_bearer_auth_header;
///
/// assert_eq!(build_bearer_auth_header("abc"), "Bearer abc");
/// ```
pub fn build_bearer_auth_header(bearer_token: &str) -> String {
    format!("Bearer {}", bearer_token)
}

/// The two calls the search logic needs from the API.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Runs one recent-search request and returns its decoded body.
    async fn recent_search(&self, query: &str) -> Result<RecentSearchBody, TransportError>;

    /// Opens the filtered stream and returns it as a line source.
    async fn open_stream(&self) -> Result<LineSource, TransportError>;
}

/// [`SearchTransport`] over HTTPS with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    bearer_token: String,
}

impl HttpTransport {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
        }
    }

    async fn get(
        &self,
        url: &str,
        operation_name: &str,
    ) -> Result<reqwest::Response, TransportError> {
        info!("Sending GET request for operation: {}", operation_name);
        debug!("Request URL: {}", url);
        debug!("Request headers: Authorization: Bearer [REDACTED]");

        let response = self
            .client
            .get(url)
            .header("Authorization", build_bearer_auth_header(&self.bearer_token))
            .send()
            .await?;

        let status = response.status();
        info!(
            "Received response with status: {} for operation: {}",
            status, operation_name
        );
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        error!("Operation '{}' failed - Status: {}", operation_name, status);
        let body = sanitize_for_logging(&error_text, 200);
        debug!("Error response for '{}': {}", operation_name, body);
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl SearchTransport for HttpTransport {
    async fn recent_search(&self, query: &str) -> Result<RecentSearchBody, TransportError> {
        let start_time = (Utc::now() - chrono::Duration::hours(1)).format("%Y-%m-%dT%H:%M:%S.000Z");
        let url = format!(
            "{}/tweets/search/recent?query={}&start_time={}&{}",
            self.base_url,
            urlencoding::encode(query),
            start_time,
            RECENT_SEARCH_FIELDS
        );

        let response = self.get(&url, "recent_search").await?;
        let response_text = response.text().await?;
        debug!(
            "Recent search response: {} bytes received",
            response_text.len()
        );
        Ok(serde_json::from_str(&response_text)?)
    }

    async fn open_stream(&self) -> Result<LineSource, TransportError> {
        let url = format!("{}/tweets/search/stream?{}", self.base_url, STREAM_FIELDS);

        let response = self.get(&url, "search_stream").await?;
        let bytes = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        Ok(Box::new(StreamReader::new(Box::pin(bytes))))
    }
}
