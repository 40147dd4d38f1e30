//! Error types for the tweetfeed service.
//!
//! Only [`SearchError`] ever reaches a caller of the search entry points.
//! Transport, decode and metric failures are recovered where they happen and
//! degrade to an empty result or a log line.

use thiserror::Error;

/// Errors returned to callers of [`crate::TwitterClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// A caller-supplied argument was rejected before any I/O took place.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failures of the HTTP layer behind [`crate::twitter::SearchTransport`].
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Twitter API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors raised while loading [`crate::AppConfig`] at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("{0} environment variable is empty")]
    Empty(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Failed to open output file: {0}")]
    OutputFile(#[from] std::io::Error),
}

/// Reasons a throughput metric could not be computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("elapsed time is zero")]
    ZeroElapsed,

    #[error("rate is not a finite number: {0}")]
    NonFiniteRate(f64),
}
