//! Per-client usage counters.
//!
//! Updated on every request outside the session slot, so everything here is
//! atomic.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters of one client.
#[derive(Debug, Default)]
pub struct ClientStats {
    requests: AtomicU64,
    bytes_downloaded: AtomicU64,
    bytes_uploaded: AtomicU64,
    rps_counter: AtomicU64,
    rps: AtomicU64,
}

impl ClientStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request about to be sent.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.rps_counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records transferred bytes.
    pub fn record_transfer(&self, uploaded: u64, downloaded: u64) {
        self.bytes_uploaded.fetch_add(uploaded, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(downloaded, Ordering::Relaxed);
    }

    /// Closes the current one-second window and publishes its count.
    pub fn tick(&self) {
        let count = self.rps_counter.swap(0, Ordering::Relaxed);
        self.rps.store(count, Ordering::Relaxed);
    }

    /// Total requests sent.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Total body bytes received (after decompression).
    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded.load(Ordering::Relaxed)
    }

    /// Total body bytes sent.
    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded.load(Ordering::Relaxed)
    }

    /// Requests sent during the last completed window.
    pub fn rps(&self) -> u64 {
        self.rps.load(Ordering::Relaxed)
    }

    /// Returns a consistent-enough copy for reporting.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests(),
            bytes_downloaded: self.bytes_downloaded(),
            bytes_uploaded: self.bytes_uploaded(),
            rps: self.rps(),
        }
    }
}

/// Plain copy of [`ClientStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Total requests.
    pub requests: u64,
    /// Total bytes downloaded.
    pub bytes_downloaded: u64,
    /// Total bytes uploaded.
    pub bytes_uploaded: u64,
    /// Requests per second over the last window.
    pub rps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_publishes_window() {
        let stats = ClientStats::new();
        stats.record_request();
        stats.record_request();
        assert_eq!(stats.rps(), 0);

        stats.tick();
        assert_eq!(stats.rps(), 2);
        assert_eq!(stats.requests(), 2);

        stats.tick();
        assert_eq!(stats.rps(), 0);
        assert_eq!(stats.requests(), 2);
    }

    #[test]
    fn test_transfer_totals() {
        let stats = ClientStats::new();
        stats.record_transfer(10, 100);
        stats.record_transfer(5, 50);
        let snap = stats.snapshot();
        assert_eq!(snap.bytes_uploaded, 15);
        assert_eq!(snap.bytes_downloaded, 150);
    }
}
