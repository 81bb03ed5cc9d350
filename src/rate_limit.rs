//! Sliding-window rate limiter keyed by user

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// Allows at most `limit` requests per user within any `window`
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    requests: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit and record a request for `user` if the window has room.
    ///
    /// Timestamps that left the window are dropped for every user, and users
    /// left with none are forgotten.
    pub fn is_allowed(&self, user: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock();

        requests.retain(|_, timestamps| {
            while let Some(&oldest) = timestamps.front() {
                if now.duration_since(oldest) >= self.window {
                    timestamps.pop_front();
                } else {
                    break;
                }
            }
            !timestamps.is_empty()
        });

        let used = requests.get(user).map(VecDeque::len).unwrap_or(0);
        if used < self.limit {
            requests.entry(user.to_string()).or_default().push_back(now);
            true
        } else {
            false
        }
    }

    /// Requests still admitted for `user` in the current window
    pub fn remaining(&self, user: &str) -> usize {
        let now = Instant::now();
        let requests = self.requests.lock();
        let used = requests
            .get(user)
            .map(|ts| ts.iter().filter(|t| now.duration_since(**t) < self.window).count())
            .unwrap_or(0);
        self.limit.saturating_sub(used)
    }
}
