//! Configuration module for the tweetfeed service.
//!
//! This module contains the configuration structure and environment variable
//! handling for the Twitter/X API integration. Configuration is loaded once at
//! startup and shared read-only afterwards.

use log::{debug, error, info, warn};
use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::sink::ResultSink;

pub const DEFAULT_API_BASE_URL: &str = "https://api.x.com/2";
pub const DEFAULT_PORT: u16 = 3000;

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The Bearer Token for app-only authentication against API v2
    pub bearer_token: String,
    /// Where metric lines go; `None` means standard output
    pub output_file: Option<PathBuf>,
    /// Base URL of the API, without a trailing slash
    pub api_base_url: String,
    /// Port of the HTTP surface
    pub port: u16,
}

/// Masks a secret for logging, keeping at most the first and last 8 characters.
pub(crate) fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let len = chars.len();
    let prefix: String = chars.iter().take(8.min(len)).collect();
    if len > 16 {
        let suffix: String = chars[len - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        format!("{}...", prefix)
    }
}

impl AppConfig {
    /// A configuration with defaults for everything but the token.
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            output_file: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Loads the configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `TWITTER_BEARER_TOKEN`: Bearer Token from the developer portal
    ///
    /// # Optional Environment Variables
    ///
    /// - `OUTPUT_FILE`: File that receives metric lines (stdout when unset or empty)
    /// - `TWITTER_API_BASE_URL`: API base URL (defaults to `https://api.x.com/2`)
    /// - `PORT`: Server port (defaults to 3000)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bearer_token = match lookup("TWITTER_BEARER_TOKEN") {
            Some(token) if token.trim().is_empty() => {
                error!("msg=[TWITTER_BEARER_TOKEN is empty: unable to initialize Twitter client]");
                return Err(ConfigError::Empty("TWITTER_BEARER_TOKEN"));
            }
            Some(token) => {
                info!(
                    "Found TWITTER_BEARER_TOKEN environment variable with length: {}",
                    token.len()
                );
                debug!("Bearer token (masked): {}", mask_secret(&token));
                if token.len() < 10 {
                    warn!(
                        "Bearer token seems unusually short ({} characters)",
                        token.len()
                    );
                }
                token
            }
            None => {
                error!("msg=[TWITTER_BEARER_TOKEN not found: unable to initialize Twitter client]");
                return Err(ConfigError::Missing("TWITTER_BEARER_TOKEN"));
            }
        };

        let output_file = match lookup("OUTPUT_FILE") {
            Some(path) if !path.trim().is_empty() => {
                info!("Metric lines will be written to {}", path);
                Some(PathBuf::from(path))
            }
            _ => {
                debug!("msg=[OUTPUT_FILE value not found, defaulting to stdout]");
                None
            }
        };

        let api_base_url = match lookup("TWITTER_API_BASE_URL") {
            Some(url) if !url.trim().is_empty() => {
                info!("Using API base URL override: {}", url);
                url.trim_end_matches('/').to_string()
            }
            _ => DEFAULT_API_BASE_URL.to_string(),
        };

        let port = match lookup("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| {
                error!("PORT must be a valid number, got '{}'", value);
                ConfigError::Invalid {
                    name: "PORT",
                    value: value.clone(),
                }
            })?,
            None => DEFAULT_PORT,
        };

        info!("Configuration loaded successfully");
        Ok(Self {
            bearer_token,
            output_file,
            api_base_url,
            port,
        })
    }

    /// Opens the configured output sink.
    pub fn open_sink(&self) -> Result<ResultSink, ConfigError> {
        match &self.output_file {
            Some(path) => Ok(ResultSink::file(path)?),
            None => Ok(ResultSink::stdout()),
        }
    }
}
