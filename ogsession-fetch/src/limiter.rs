//! Token bucket limiter.
//!
//! Reservation based: a caller takes a token immediately, possibly driving
//! the bucket negative, and then sleeps until its reservation matures.
//! Cancelling while asleep hands the token back.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::HttpError;

#[derive(Debug)]
struct BucketState {
    rate: f64,
    burst: f64,
    tokens: f64,
    last: Instant,
}

impl BucketState {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.burst);
        self.last = now;
    }
}

/// Token bucket shared by every request of one client.
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Creates a bucket refilling `rate` tokens per second up to `burst`.
    ///
    /// A rate of zero disables limiting.
    pub fn new(rate: u32, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            state: Mutex::new(BucketState {
                rate: f64::from(rate),
                burst,
                tokens: burst,
                last: Instant::now(),
            }),
        }
    }

    /// Changes the refill rate. Zero disables limiting.
    pub fn set_rate(&self, rate: u32) {
        let mut state = self.lock();
        state.refill(Instant::now());
        state.rate = f64::from(rate);
        if rate == 0 {
            state.tokens = state.burst;
        }
    }

    /// Returns the configured rate.
    pub fn rate(&self) -> u32 {
        // Rates are set from u32, so the cast is exact.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rate = self.lock().rate as u32;
        rate
    }

    /// Waits until a token is available.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), HttpError> {
        if cancel.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        let wait = {
            let mut state = self.lock();
            if state.rate <= 0.0 {
                return Ok(());
            }
            state.refill(Instant::now());
            state.tokens -= 1.0;
            if state.tokens >= 0.0 {
                return Ok(());
            }
            Duration::from_secs_f64(-state.tokens / state.rate)
        };

        trace!(wait_ms = wait.as_millis(), "Waiting for rate limiter");

        tokio::select! {
            () = tokio::time::sleep(wait) => Ok(()),
            () = cancel.cancelled() => {
                let mut state = self.lock();
                state.tokens = (state.tokens + 1.0).min(state.burst);
                Err(HttpError::Cancelled)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BucketState> {
        // A poisoned bucket only means another request panicked mid-update;
        // the numbers are still usable.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
