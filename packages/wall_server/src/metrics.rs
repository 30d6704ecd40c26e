//! Server metrics for observability
//!
//! Counts served operations and failures for the `/metrics` and `/health` endpoints.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Directory operations served over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Listing,
    Search,
    Detail,
    Stats,
    Random,
    Sitemap,
}

/// Server-wide metrics
#[derive(Debug, Default)]
pub struct ServerMetrics {
    // Request metrics
    pub listings: AtomicU64,
    pub searches: AtomicU64,
    pub details: AtomicU64,
    pub stats: AtomicU64,
    pub random_picks: AtomicU64,
    pub sitemaps: AtomicU64,

    // Error metrics
    /// Requests rejected for malformed criteria
    pub validation_errors: AtomicU64,
    /// Remote fetches that failed (transport, status or decode)
    pub remote_errors: AtomicU64,
    /// Detail requests for a slug the locale does not have
    pub not_found: AtomicU64,
    /// Milliseconds since start at the last remote failure, plus one (0 = never)
    last_remote_error_ms: AtomicU64,

    /// Server start time (for uptime calculation)
    start_time: Option<Instant>,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn served(&self, operation: Operation) {
        let counter = match operation {
            Operation::Listing => &self.listings,
            Operation::Search => &self.searches,
            Operation::Detail => &self.details,
            Operation::Stats => &self.stats,
            Operation::Random => &self.random_picks,
            Operation::Sitemap => &self.sitemaps,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn validation_error(&self) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn remote_error(&self) {
        self.remote_errors.fetch_add(1, Ordering::Relaxed);
        self.last_remote_error_ms
            .store(self.elapsed_ms() + 1, Ordering::Relaxed);
    }

    /// True if a remote fetch failed within the last `window`.
    pub fn remote_failed_within(&self, window: Duration) -> bool {
        self.last_remote_error_ms.load(Ordering::Relaxed) != 0
            && self.ms_since_remote_error() < window.as_millis() as u64
    }

    /// Whole seconds since the last remote failure, if any.
    pub fn secs_since_remote_error(&self) -> Option<u64> {
        match self.last_remote_error_ms.load(Ordering::Relaxed) {
            0 => None,
            _ => Some(self.ms_since_remote_error() / 1000),
        }
    }

    fn ms_since_remote_error(&self) -> u64 {
        let at = self.last_remote_error_ms.load(Ordering::Relaxed).saturating_sub(1);
        self.elapsed_ms().saturating_sub(at)
    }

    fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    pub fn not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }

    /// Create a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            requests: RequestMetrics {
                listings: self.listings.load(Ordering::Relaxed),
                searches: self.searches.load(Ordering::Relaxed),
                details: self.details.load(Ordering::Relaxed),
                stats: self.stats.load(Ordering::Relaxed),
                random_picks: self.random_picks.load(Ordering::Relaxed),
                sitemaps: self.sitemaps.load(Ordering::Relaxed),
            },
            errors: ErrorMetrics {
                validation: self.validation_errors.load(Ordering::Relaxed),
                remote: self.remote_errors.load(Ordering::Relaxed),
                not_found: self.not_found.load(Ordering::Relaxed),
            },
        }
    }
}

/// Serializable snapshot of metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests: RequestMetrics,
    pub errors: ErrorMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetrics {
    pub listings: u64,
    pub searches: u64,
    pub details: u64,
    pub stats: u64,
    pub random_picks: u64,
    pub sitemaps: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub validation: u64,
    pub remote: u64,
    pub not_found: u64,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub remote: String,
    /// Remote failures since startup
    pub remote_errors_total: u64,
    pub last_remote_error_secs_ago: Option<u64>,
    pub uptime_secs: u64,
}
