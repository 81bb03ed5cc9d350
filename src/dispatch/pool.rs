//! Ordered endpoint pool with latency-based reordering

use super::endpoint::Endpoint;
use super::health::{EndpointHealth, HealthTracker};
use crate::config::DispatchConfig;
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of probing one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub url: String,
    /// Round-trip time, `None` when the probe failed
    pub latency: Option<Duration>,
    pub error: Option<String>,
}

/// Endpoints in trial-priority order.
///
/// Membership is fixed at construction; only the order changes. Senders take
/// a snapshot of the order at call start, so a reorder never affects a call
/// already in flight.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: RwLock<Vec<Arc<Endpoint>>>,
    health: Arc<HealthTracker>,
    probe_path: String,
    probe_timeout: Duration,
}

impl EndpointPool {
    /// Build the pool from config, sharing one HTTP client across endpoints
    pub fn new(config: &DispatchConfig, client: reqwest::Client) -> Self {
        let endpoints = config
            .enabled_endpoints()
            .into_iter()
            .map(|cfg| {
                let timeout = config.timeout_for(&cfg);
                Arc::new(Endpoint::new(cfg, client.clone(), timeout, config.tunnel_bypass))
            })
            .collect();

        Self {
            endpoints: RwLock::new(endpoints),
            health: Arc::new(HealthTracker::new(
                config.failure_threshold,
                config.failure_cooldown,
            )),
            probe_path: config.probe_path.clone(),
            probe_timeout: config.probe_timeout,
        }
    }

    /// Get number of endpoints
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.read().len()
    }

    /// Get health tracker
    pub fn health_tracker(&self) -> Arc<HealthTracker> {
        self.health.clone()
    }

    /// Current order, every endpoint included
    pub fn snapshot(&self) -> Vec<Arc<Endpoint>> {
        self.endpoints.read().clone()
    }

    /// Current order minus endpoints cooling down after repeated failure.
    ///
    /// If every endpoint is cooling down, all of them are returned.
    pub fn select_endpoints(&self) -> Vec<Arc<Endpoint>> {
        let all = self.snapshot();
        let available: Vec<_> = all
            .iter()
            .filter(|e| self.health.is_available(e.url()))
            .cloned()
            .collect();

        if available.is_empty() {
            tracing::debug!("All endpoints excluded, trying every endpoint");
            all
        } else {
            available
        }
    }

    /// List all endpoint URLs in current order
    pub fn list_endpoints(&self) -> Vec<String> {
        self.endpoints
            .read()
            .iter()
            .map(|e| e.url().to_string())
            .collect()
    }

    /// Get health info for all endpoints in current order
    pub fn get_endpoint_health(&self) -> Vec<(String, Option<EndpointHealth>)> {
        self.list_endpoints()
            .into_iter()
            .map(|url| {
                let health = self.health.get_health(&url);
                (url, health)
            })
            .collect()
    }

    /// Probe every endpoint concurrently and record the results
    pub async fn probe_all(&self) -> Vec<ProbeResult> {
        let endpoints = self.snapshot();
        let probes = endpoints.iter().map(|endpoint| async move {
            match endpoint.probe(&self.probe_path, self.probe_timeout).await {
                Ok(latency) => ProbeResult {
                    url: endpoint.url().to_string(),
                    latency: Some(latency),
                    error: None,
                },
                Err(e) => ProbeResult {
                    url: endpoint.url().to_string(),
                    latency: None,
                    error: Some(e.to_string()),
                },
            }
        });

        let results = join_all(probes).await;
        for result in &results {
            self.health.record_probe(&result.url, result.latency);
        }
        results
    }

    /// Probe, then sort ascending by latency. Failed probes go last, keeping
    /// their relative order; nothing is removed.
    pub async fn reorder_by_latency(&self) -> Vec<ProbeResult> {
        let mut results = self.probe_all().await;
        sort_by_latency(&mut results);

        let mut endpoints = self.endpoints.write();
        let current = std::mem::take(&mut *endpoints);
        *endpoints = apply_order(current, &results);

        tracing::info!(
            "Reordered endpoints: {}",
            endpoints
                .iter()
                .map(|e| e.url())
                .collect::<Vec<_>>()
                .join(", ")
        );

        results
    }
}

/// Stable ascending sort; a failed probe counts as infinite latency
pub fn sort_by_latency(results: &mut [ProbeResult]) {
    results.sort_by_key(|r| (r.latency.is_none(), r.latency));
}

/// Rearrange `endpoints` to follow `order`. Endpoints missing from `order`
/// keep their relative position at the end.
fn apply_order(mut endpoints: Vec<Arc<Endpoint>>, order: &[ProbeResult]) -> Vec<Arc<Endpoint>> {
    let mut sorted = Vec::with_capacity(endpoints.len());
    for result in order {
        if let Some(pos) = endpoints.iter().position(|e| e.url() == result.url) {
            sorted.push(endpoints.remove(pos));
        }
    }
    sorted.extend(endpoints);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

    fn result(url: &str, ms: Option<u64>) -> ProbeResult {
        ProbeResult {
            url: url.to_string(),
            latency: ms.map(Duration::from_millis),
            error: None,
        }
    }

    fn pool(urls: &[&str]) -> EndpointPool {
        let config = DispatchConfig::builder()
            .endpoints(urls.iter().copied())
            .failure_exclusion(1, Duration::from_secs(60))
            .build()
            .unwrap();
        EndpointPool::new(&config, reqwest::Client::new())
    }

    #[test]
    fn test_sort_failed_probes_last() {
        let mut results = vec![
            result("a", None),
            result("b", Some(300)),
            result("c", Some(100)),
            result("d", None),
        ];
        sort_by_latency(&mut results);

        let urls: Vec<_> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_apply_order_keeps_membership() {
        let pool = pool(&["http://a.test", "http://b.test", "http://c.test"]);
        let order = vec![result("http://c.test", Some(5)), result("http://a.test", None)];

        let reordered = apply_order(pool.snapshot(), &order);
        let urls: Vec<_> = reordered.iter().map(|e| e.url()).collect();
        assert_eq!(urls, vec!["http://c.test", "http://a.test", "http://b.test"]);
    }

    #[tokio::test]
    async fn test_select_skips_excluded_until_all_excluded() {
        let pool = pool(&["http://a.test", "http://b.test"]);
        let health = pool.health_tracker();

        health.record_failure("http://a.test");
        let selected: Vec<_> = pool
            .select_endpoints()
            .iter()
            .map(|e| e.url().to_string())
            .collect();
        assert_eq!(selected, vec!["http://b.test"]);

        health.record_failure("http://b.test");
        assert_eq!(pool.select_endpoints().len(), 2);
    }

    #[test]
    fn test_disabled_endpoints_not_pooled() {
        let config = DispatchConfig::builder()
            .endpoint(EndpointConfig::new("http://a.test"))
            .endpoint(EndpointConfig::new("http://b.test").with_enabled(false))
            .build()
            .unwrap();
        let pool = EndpointPool::new(&config, reqwest::Client::new());
        assert_eq!(pool.list_endpoints(), vec!["http://a.test"]);
    }
}
