//! Dispatch counters for observability
//!
//! Counters only ever grow; they live as long as the owning dispatcher.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-lifetime counters for one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Sends that went to the network (cache misses)
    requests: AtomicU64,
    /// Individual HTTP attempts across all endpoints
    attempts: AtomicU64,
    /// Sends answered by a backend
    successes: AtomicU64,
    /// Sends that fell back after exhausting every endpoint
    failures: AtomicU64,
    /// Sends answered from the reply cache
    cache_hits: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn inc_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn inc_successes(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests(),
            attempts: self.attempts(),
            successes: self.successes(),
            failures: self.failures(),
            cache_hits: self.cache_hits(),
        }
    }
}

/// Point-in-time copy of [`DispatchMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub cache_hits: u64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests={} attempts={} successes={} failures={} cache_hits={}",
            self.requests, self.attempts, self.successes, self.failures, self.cache_hits
        )
    }
}
