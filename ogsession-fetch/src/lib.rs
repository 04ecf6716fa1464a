// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # ogsession Fetch
//!
//! HTTP plumbing shared by the lobby client, the login flow, and the game
//! page fetcher.
//!
//! - [`RateLimitedClient`] - token bucket, cookie jar, usage counters
//! - [`BufferedResponse`] - fully read and gunzipped response
//! - [`TokenBucket`] - the limiter on its own
//! - [`Backoff`] - reconnect delays for background connections
//!
//! ## Example
//!
//! ```ignore
//! use ogsession_fetch::{ClientSettings, RateLimitedClient};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = RateLimitedClient::with_settings(ClientSettings::default().with_rate(5))?;
//! let response = client.get("https://lobby.ogame.gameforge.com/api/servers", &CancellationToken::new()).await?;
//! println!("{}", response.status);
//! ```

pub mod client;
pub mod error;
pub mod limiter;
pub mod response;
pub mod retry;
pub mod stats;

pub use client::{ClientSettings, DEFAULT_USER_AGENT, RateLimitedClient};
pub use error::HttpError;
pub use limiter::TokenBucket;
pub use response::BufferedResponse;
pub use retry::Backoff;
pub use stats::{ClientStats, StatsSnapshot};

// Re-exported so callers can build requests without depending on reqwest.
pub use reqwest::{Method, StatusCode, header};
