//! Message dispatcher: cache, failover, racing

use super::endpoint::Endpoint;
use super::payload::MessageRequest;
use super::pool::{EndpointPool, ProbeResult};
use super::retry::{random_jitter, retry_with_backoff, RetryPolicy};
use crate::cache::ResponseCache;
use crate::config::{DispatchConfig, DispatchMode};
use crate::error::{AttemptError, Result};
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Delivers messages to the first backend that answers.
///
/// Construct one at startup and share it behind an `Arc`. `send` never fails:
/// it returns either a backend reply or the configured fallback text.
#[derive(Debug)]
pub struct Dispatcher {
    config: DispatchConfig,
    pool: EndpointPool,
    cache: ResponseCache,
    metrics: DispatchMetrics,
    retry: RetryPolicy,
}

impl Dispatcher {
    /// Create a dispatcher from a validated config
    pub fn new(config: DispatchConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("chatwire/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            pool: EndpointPool::new(&config, client),
            cache: ResponseCache::new(config.cache_ttl),
            metrics: DispatchMetrics::new(),
            retry: RetryPolicy::new(config.retry_attempts, config.backoff_base, config.jitter_max),
            config,
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Send a message and return the reply, or the fallback text
    pub async fn send(&self, message: &str) -> String {
        self.send_request(MessageRequest::new(message)).await
    }

    /// Send a prepared request (message plus optional `jid`).
    ///
    /// The cache is keyed by message text only.
    pub async fn send_request(&self, request: MessageRequest) -> String {
        if let Some(reply) = self.cache.get(&request.message) {
            self.metrics.inc_cache_hits();
            tracing::debug!("Cache hit for message ({} chars)", request.message.len());
            return reply;
        }

        self.metrics.inc_requests();
        let endpoints = self.pool.select_endpoints();

        let delivered = match self.config.mode {
            DispatchMode::Sequential => self.dispatch_sequential(&endpoints, &request).await,
            DispatchMode::Race => self.dispatch_race(&endpoints, &request).await,
        };

        match delivered {
            Some((url, reply)) => {
                tracing::debug!("Reply received from {}", url);
                self.metrics.inc_successes();
                self.cache.insert(request.message, reply.clone());
                reply
            }
            None => {
                tracing::warn!("All {} endpoints failed, returning fallback", endpoints.len());
                self.metrics.inc_failures();
                self.config.fallback_reply.clone()
            }
        }
    }

    /// Exhaust each endpoint in order; stop at the first reply
    async fn dispatch_sequential(
        &self,
        endpoints: &[Arc<Endpoint>],
        request: &MessageRequest,
    ) -> Option<(String, String)> {
        for endpoint in endpoints {
            if let Ok(reply) = self.deliver(endpoint, request).await {
                return Some((endpoint.url().to_string(), reply));
            }
        }
        None
    }

    /// Start every endpoint at once and take the first reply.
    ///
    /// Losers are dropped when this returns, which cancels their requests.
    /// Only the winner's reply reaches the cache.
    async fn dispatch_race(
        &self,
        endpoints: &[Arc<Endpoint>],
        request: &MessageRequest,
    ) -> Option<(String, String)> {
        let mut pending: FuturesUnordered<_> = endpoints
            .iter()
            .map(|endpoint| async move {
                let result = self.deliver(endpoint, request).await;
                (endpoint.url().to_string(), result)
            })
            .collect();

        while let Some((url, result)) = pending.next().await {
            if let Ok(reply) = result {
                return Some((url, reply));
            }
        }
        None
    }

    /// All attempts against one endpoint under the retry policy
    async fn deliver(
        &self,
        endpoint: &Endpoint,
        request: &MessageRequest,
    ) -> std::result::Result<String, AttemptError> {
        let health = self.pool.health_tracker();
        let jitter_max = self.config.jitter_max;

        let result = retry_with_backoff(
            &self.retry,
            |attempt| {
                self.metrics.inc_attempts();
                tracing::debug!(
                    "POST {} attempt {}/{} (timeout {:?})",
                    endpoint.url(),
                    attempt,
                    self.retry.max_attempts,
                    endpoint.timeout()
                );
                endpoint.post_message(request)
            },
            || random_jitter(jitter_max),
        )
        .await;

        match &result {
            Ok(_) => health.record_success(endpoint.url()),
            Err(e) => {
                tracing::warn!("Endpoint {} failed: {}", endpoint.url(), e);
                if e.is_retryable() {
                    health.record_failure(endpoint.url());
                }
            }
        }

        result
    }

    /// Probe all endpoints and reorder them for later sends
    pub async fn reorder_by_latency(&self) -> Vec<ProbeResult> {
        self.pool.reorder_by_latency().await
    }

    /// Probe all endpoints and log the results; the order is left alone
    pub async fn health_check(&self) -> Vec<ProbeResult> {
        let results = self.pool.probe_all().await;
        for result in &results {
            match (&result.latency, &result.error) {
                (Some(latency), _) => {
                    tracing::info!("Health check {}: up ({:?})", result.url, latency)
                }
                (None, Some(e)) => tracing::warn!("Health check {}: down ({})", result.url, e),
                (None, None) => tracing::warn!("Health check {}: down", result.url),
            }
        }
        results
    }

    /// Upper bound on how long a send can take when every endpoint fails
    pub fn worst_case_duration(&self) -> Duration {
        let per_endpoint = |e: &Arc<Endpoint>| {
            e.timeout().saturating_mul(self.retry.max_attempts) + self.retry.max_total_backoff()
        };
        let endpoints = self.pool.snapshot();
        match self.config.mode {
            DispatchMode::Sequential => endpoints.iter().map(per_endpoint).sum(),
            DispatchMode::Race => endpoints.iter().map(per_endpoint).max().unwrap_or_default(),
        }
    }
}
