//! Rate-limited HTTP client.
//!
//! Wraps a `reqwest` client with:
//! - a token bucket every request waits on
//! - per-instance usage counters and a requests-per-second gauge
//! - a shared cookie jar
//! - fully buffered, gunzipped response bodies

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::HttpError;
use crate::limiter::TokenBucket;
use crate::response::BufferedResponse;
use crate::stats::{ClientStats, StatsSnapshot};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default burst size of the token bucket.
const DEFAULT_BURST: u32 = 6;

/// Width of the requests-per-second window.
const RPS_WINDOW: Duration = Duration::from_secs(1);

/// Default browser-like user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Accept-Encoding value sent with every request.
const ACCEPT_ENCODING_VALUE: &str = "gzip";

// ============================================================================
// Client Settings
// ============================================================================

/// Settings for a [`RateLimitedClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Steady-state requests per second. Zero disables limiting.
    pub requests_per_second: u32,
    /// Requests allowed back to back before the steady rate applies.
    pub burst: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent header.
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            requests_per_second: 0,
            burst: DEFAULT_BURST,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientSettings {
    /// Sets the steady-state rate.
    pub fn with_rate(mut self, requests_per_second: u32) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    /// Sets the burst size.
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = burst;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============================================================================
// Rate-Limited Client
// ============================================================================

/// HTTP client with a token bucket, usage counters, and a cookie jar.
///
/// Cloning is cheap; clones share the limiter, counters, and cookies.
#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    jar: Arc<Jar>,
    limiter: TokenBucket,
    stats: Arc<ClientStats>,
    user_agent: RwLock<String>,
    ticker: Option<JoinHandle<()>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl RateLimitedClient {
    /// Creates a client with default settings.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_settings(ClientSettings::default())
    }

    /// Creates a client with custom settings.
    ///
    /// When called inside a Tokio runtime, a background task refreshes the
    /// requests-per-second gauge every second for as long as the client
    /// lives. Outside a runtime the gauge stays at zero.
    pub fn with_settings(settings: ClientSettings) -> Result<Self, HttpError> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .timeout(settings.timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        let stats = Arc::new(ClientStats::new());
        let ticker = spawn_rps_ticker(Arc::clone(&stats));

        debug!(
            rps = settings.requests_per_second,
            burst = settings.burst,
            "Created rate-limited client"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                jar,
                limiter: TokenBucket::new(settings.requests_per_second, settings.burst),
                stats,
                user_agent: RwLock::new(settings.user_agent),
                ticker,
            }),
        })
    }

    /// Starts building a request. Send it with [`execute`](Self::execute).
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.inner.http.request(method, url)
    }

    /// Waits on the limiter, sends the request, and buffers the response.
    #[instrument(skip_all)]
    pub async fn execute(
        &self,
        builder: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<BufferedResponse, HttpError> {
        let mut request = builder.build()?;
        {
            let headers = request.headers_mut();
            if !headers.contains_key(USER_AGENT) {
                let ua = self.user_agent();
                if let Ok(value) = HeaderValue::from_str(&ua) {
                    headers.insert(USER_AGENT, value);
                }
            }
            headers
                .entry(ACCEPT_ENCODING)
                .or_insert(HeaderValue::from_static(ACCEPT_ENCODING_VALUE));
        }

        self.inner.limiter.acquire(cancel).await?;
        self.inner.stats.record_request();

        let method = request.method().clone();
        let url = request.url().clone();
        let uploaded = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .map_or(0, <[u8]>::len) as u64;

        debug!(%method, url = %url, "Sending request");

        let response = tokio::select! {
            res = self.inner.http.execute(request) => res?,
            () = cancel.cancelled() => {
                warn!(url = %url, "Request cancelled");
                return Err(HttpError::Cancelled);
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().clone();

        let raw = tokio::select! {
            body = response.bytes() => body?,
            () = cancel.cancelled() => return Err(HttpError::Cancelled),
        };

        let buffered = BufferedResponse::new(status, headers, final_url, raw.to_vec())?;
        self.inner
            .stats
            .record_transfer(uploaded, buffered.len() as u64);

        debug!(%status, bytes = buffered.len(), "Response received");
        Ok(buffered)
    }

    /// Performs a GET request.
    pub async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<BufferedResponse, HttpError> {
        self.execute(self.request(Method::GET, url), cancel).await
    }

    /// Returns the `Cookie` header the jar would send to `url`.
    pub fn cookies_for(&self, url: &str) -> Result<Option<String>, HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        Ok(self
            .inner
            .jar
            .cookies(&parsed)
            .and_then(|v| v.to_str().ok().map(str::to_string)))
    }

    /// Returns the value of one cookie the jar would send to `url`.
    pub fn cookie_value(&self, url: &str, name: &str) -> Option<String> {
        let header = self.cookies_for(url).ok().flatten()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    /// Adds a cookie to the jar for `url`.
    pub fn add_cookie(&self, url: &str, cookie: &str) -> Result<(), HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        self.inner.jar.add_cookie_str(cookie, &parsed);
        Ok(())
    }

    /// Changes the steady-state rate. Zero disables limiting.
    pub fn set_max_rps(&self, requests_per_second: u32) {
        self.inner.limiter.set_rate(requests_per_second);
    }

    /// Returns the configured steady-state rate.
    pub fn max_rps(&self) -> u32 {
        self.inner.limiter.rate()
    }

    /// Returns the user agent.
    pub fn user_agent(&self) -> String {
        self.inner
            .user_agent
            .read()
            .map_or_else(|e| e.into_inner().clone(), |ua| ua.clone())
    }

    /// Replaces the user agent.
    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        let value = user_agent.into();
        match self.inner.user_agent.write() {
            Ok(mut ua) => *ua = value,
            Err(e) => *e.into_inner() = value,
        }
    }

    /// Live counters.
    pub fn stats(&self) -> &ClientStats {
        &self.inner.stats
    }

    /// Copy of the counters.
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }
}

fn spawn_rps_ticker(stats: Arc<ClientStats>) -> Option<JoinHandle<()>> {
    let handle = tokio::runtime::Handle::try_current().ok()?;
    Some(handle.spawn(async move {
        let mut interval = tokio::time::interval(RPS_WINDOW);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            stats.tick();
        }
    }))
}
