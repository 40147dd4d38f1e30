//! Caller-facing search entry points.
//!
//! Arguments are validated before any I/O. After that nothing fails: a
//! transport error is logged and answered with an empty result.

use log::{info, warn};
use std::sync::Arc;
use tokio::time::Instant;

use super::api::SearchTransport;
use super::stream::{consume, StreamBudget};
use crate::aggregate::{aggregate_bulk, aggregate_stream};
use crate::error::SearchError;
use crate::metrics::{MetricsRecorder, RequestKind};
use crate::model::AggregatedResult;

/// Search entry points over a [`SearchTransport`], recording one metric per
/// completed request.
pub struct TwitterClient {
    transport: Arc<dyn SearchTransport>,
    recorder: MetricsRecorder,
}

impl TwitterClient {
    /// Creates a client.
    ///
    /// # Parameters
    ///
    /// - `transport`: The API transport, usually an [`HttpTransport`](super::HttpTransport)
    /// - `recorder`: Receives one metric line per successful request
    pub fn new(transport: Arc<dyn SearchTransport>, recorder: MetricsRecorder) -> Self {
        Self {
            transport,
            recorder,
        }
    }

    /// Runs one recent-search request for `query` and groups the results by author.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidArgument`] for an empty or blank query.
    /// API failures are not errors; they yield an empty result.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use tweetfeed::{AppConfig, HttpTransport, MetricsRecorder, ResultSink, TwitterClient};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let config = AppConfig::from_env().unwrap();
    ///     let recorder = MetricsRecorder::new(Arc::new(ResultSink::stdout()));
    ///     let client = TwitterClient::new(Arc::new(HttpTransport::new(&config)), recorder);
    ///     let result = client.search_recent("rustlang").await.unwrap();
    ///     println!("{}", result);
    /// }
    /// ```
    pub async fn search_recent(&self, query: &str) -> Result<AggregatedResult, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidArgument(
                "query cannot be empty".to_string(),
            ));
        }
        info!("Starting recent search for query: '{}'", query);

        let started = Instant::now();
        match self.transport.recent_search(query).await {
            Ok(body) => {
                let (authors, messages) = body.into_parts();
                info!(
                    "Recent search returned {} tweets and {} users",
                    messages.len(),
                    authors.len()
                );
                let result = aggregate_bulk(authors, messages);
                self.recorder.record(RequestKind::Search, started, &result);
                Ok(result)
            }
            Err(e) => {
                warn!("msg=[Failed to get response from Twitter API], error=[{}]", e);
                Ok(AggregatedResult::empty())
            }
        }
    }

    /// Consumes the filtered stream for at most `max_wait_seconds` seconds or
    /// `max_hits` decoded events, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidArgument`] if either budget is below 1.
    pub async fn search_stream(
        &self,
        max_wait_seconds: u64,
        max_hits: usize,
    ) -> Result<AggregatedResult, SearchError> {
        let budget = StreamBudget::new(max_wait_seconds, max_hits)?;
        info!(
            "Starting stream search with budget of {}s / {} hits",
            max_wait_seconds, max_hits
        );

        let started = Instant::now();
        let source = match self.transport.open_stream().await {
            Ok(source) => source,
            Err(e) => {
                warn!("msg=[Failed to get response from Twitter API], error=[{}]", e);
                return Ok(AggregatedResult::empty());
            }
        };

        let consumed = consume(source, budget).await;
        let result = aggregate_stream(consumed.events);
        self.recorder.record(RequestKind::Stream, started, &result);
        Ok(result)
    }
}
