//! # Tweetfeed
//!
//! HTTP service exposing recent search and bounded filtered-stream
//! consumption of the Twitter/X API v2, with results grouped by author.
//!
//! ## Environment Variables
//!
//! - `TWITTER_BEARER_TOKEN`: Bearer Token (required)
//! - `OUTPUT_FILE`: file receiving metric lines (defaults to stdout)
//! - `TWITTER_API_BASE_URL`: API base URL override
//! - `PORT`: Server port (defaults to 3000)

use log::{error, info};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use tweetfeed::{
    build_router, AppConfig, AppState, HttpTransport, MetricsRecorder, TwitterClient,
};

/// Main entry point for the tweetfeed web service.
///
/// Loads the configuration, opens the output sink, and serves the HTTP
/// routes until Ctrl-C is received.
///
/// # Example Usage
///
/// ```bash
/// TWITTER_BEARER_TOKEN=... cargo run
///
/// # Run on custom port with debug logging
/// PORT=8080 RUST_LOG=debug TWITTER_BEARER_TOKEN=... cargo run
/// ```
#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logging system
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let sink = match config.open_sink() {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            error!("Failed to open output sink: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let transport = Arc::new(HttpTransport::new(&config));
    let client = TwitterClient::new(transport, MetricsRecorder::new(sink));
    let state = AppState {
        client: Arc::new(client),
    };

    let app = build_router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Starting tweetfeed server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!("HTTP server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
