//! Twitter/X API integration module.
//!
//! This module contains the wire models of the API v2 payloads, the stream
//! line decoder, the bounded stream consumer, the HTTP transport and the
//! [`TwitterClient`] entry points built on top of them.

mod api;
mod client;
mod decode;
mod stream;
mod wire;

pub use api::{build_bearer_auth_header, HttpTransport, LineSource, SearchTransport};
pub use client::TwitterClient;
pub use decode::{decode, decode_bytes, StreamEvent};
pub use stream::{consume, ConsumedStream, StopReason, StreamBudget};
pub use wire::{RecentSearchBody, StreamLine, WireIncludes, WireTweet, WireUser};
