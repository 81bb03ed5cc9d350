//! Per-endpoint latency and failure bookkeeping

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Observed state of one endpoint
#[derive(Debug, Clone, Default)]
pub struct EndpointHealth {
    /// Round-trip time of the last successful probe
    pub latency: Option<Duration>,
    /// Whether the last probe succeeded
    pub last_probe_ok: Option<bool>,
    /// Failed sends in a row
    pub consecutive_failures: u32,
    /// Skip this endpoint until then
    pub excluded_until: Option<Instant>,
    /// Total successful deliveries
    pub successes: u64,
    /// Total failed deliveries
    pub failures: u64,
}

impl fmt::Display for EndpointHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "successes={} failures={}", self.successes, self.failures)?;
        if let Some(latency) = self.latency {
            write!(f, " latency={}ms", latency.as_millis())?;
        }
        match self.last_probe_ok {
            Some(true) => write!(f, " probe=up")?,
            Some(false) => write!(f, " probe=down")?,
            None => {}
        }
        if self.excluded_until.is_some_and(|until| Instant::now() < until) {
            write!(f, " excluded")?;
        }
        Ok(())
    }
}

/// Tracks endpoint health and applies the temporary exclusion policy.
///
/// With a threshold of 0 endpoints are never excluded.
#[derive(Debug)]
pub struct HealthTracker {
    health: RwLock<HashMap<String, EndpointHealth>>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl HealthTracker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            health: RwLock::new(HashMap::new()),
            failure_threshold,
            cooldown,
        }
    }

    /// A delivery to `url` succeeded
    pub fn record_success(&self, url: &str) {
        let mut health = self.health.write();
        let entry = health.entry(url.to_string()).or_default();
        entry.successes += 1;
        entry.consecutive_failures = 0;
        entry.excluded_until = None;
    }

    /// A delivery to `url` failed after all its attempts
    pub fn record_failure(&self, url: &str) {
        let mut health = self.health.write();
        let entry = health.entry(url.to_string()).or_default();
        entry.failures += 1;
        entry.consecutive_failures += 1;

        if self.failure_threshold > 0 && entry.consecutive_failures >= self.failure_threshold {
            entry.excluded_until = Some(Instant::now() + self.cooldown);
            tracing::warn!(
                "Excluding {} for {:?} after {} consecutive failures",
                url,
                self.cooldown,
                entry.consecutive_failures
            );
        }
    }

    /// Record a probe outcome
    pub fn record_probe(&self, url: &str, latency: Option<Duration>) {
        let mut health = self.health.write();
        let entry = health.entry(url.to_string()).or_default();
        entry.last_probe_ok = Some(latency.is_some());
        if latency.is_some() {
            entry.latency = latency;
        }
    }

    /// Whether `url` may be used right now
    pub fn is_available(&self, url: &str) -> bool {
        match self.health.read().get(url).and_then(|h| h.excluded_until) {
            Some(until) => Instant::now() >= until,
            None => true,
        }
    }

    /// Get health info for an endpoint
    pub fn get_health(&self, url: &str) -> Option<EndpointHealth> {
        self.health.read().get(url).cloned()
    }
}
