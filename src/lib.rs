//! # Tweetfeed Library
//!
//! Fetches tweets matching a query from the Twitter/X API v2 and groups them
//! by author in chronological order. Two entry points are provided:
//!
//! - a single recent-search request ([`TwitterClient::search_recent`])
//! - bounded consumption of the filtered stream under a time budget and a
//!   hit budget ([`TwitterClient::search_stream`])
//!
//! Both produce an [`AggregatedResult`]: authors sorted by account creation
//! time, each with its tweets sorted by creation time.
//!
//! ## Configuration
//!
//! - `TWITTER_BEARER_TOKEN`: Bearer Token (required)
//! - `OUTPUT_FILE`: file receiving metric lines (defaults to stdout)
//! - `TWITTER_API_BASE_URL`: API base URL (defaults to `https://api.x.com/2`)
//! - `PORT`: Server port (defaults to 3000)
//!
//! ## API Endpoints
//!
//! - `GET /health`: Returns service health status
//! - `GET /search?query=...`: Recent search grouped by author
//! - `GET /stream?wait_seconds=...&max_hits=...`: Bounded stream grouped by author

pub mod aggregate;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod model;
pub mod sink;
pub mod twitter;

// Re-export commonly used types and functions
pub use aggregate::{aggregate_bulk, aggregate_stream};
pub use config::AppConfig;
pub use error::{ConfigError, MetricError, SearchError, TransportError};
pub use handlers::{build_router, AppState};
pub use metrics::{MetricsRecorder, RequestKind};
pub use model::{AggregatedResult, Author, Message};
pub use sink::ResultSink;
pub use twitter::{HttpTransport, SearchTransport, StreamBudget, StreamEvent, TwitterClient};
