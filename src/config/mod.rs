//! Dispatcher configuration

mod defaults;
mod endpoint;
mod file;

pub use defaults::default_endpoints;
pub use endpoint::EndpointConfig;
pub use file::{ConfigFile, DisabledEndpoints, IdentitySettings, RateLimitSettings, Settings};

use crate::error::{ConfigError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Fallback text shown to the user when no backend could answer
pub const DEFAULT_FALLBACK_REPLY: &str = "✦ No se pudo conectar al servidor. ¡Inténtalo de nuevo!";

/// How multiple endpoints are tried for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Exhaust each endpoint in priority order before moving on
    #[default]
    #[value(alias = "seq", alias = "fallback")]
    Sequential,
    /// Fire at every endpoint at once, first valid reply wins
    #[value(alias = "parallel", alias = "concurrent")]
    Race,
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchMode::Sequential => write!(f, "sequential"),
            DispatchMode::Race => write!(f, "race"),
        }
    }
}

/// Runtime configuration for a [`crate::Dispatcher`]
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Candidate endpoints, in initial priority order
    pub endpoints: Vec<EndpointConfig>,
    /// Sequential fallback or concurrent race
    pub mode: DispatchMode,
    /// Default per-attempt timeout
    pub timeout: Duration,
    /// Total attempts per endpoint (first try included)
    pub retry_attempts: u32,
    /// Backoff base; the delay before retry `k` is `backoff_base * k`
    pub backoff_base: Duration,
    /// Upper bound of the random jitter added to each backoff
    pub jitter_max: Duration,
    /// Lifetime of a cached reply
    pub cache_ttl: Duration,
    /// Reply returned when every endpoint failed
    pub fallback_reply: String,
    /// Send the `bypass-tunnel-reminder` header
    pub tunnel_bypass: bool,
    /// Consecutive failures before an endpoint is skipped (0 disables)
    pub failure_threshold: u32,
    /// How long a failing endpoint is skipped
    pub failure_cooldown: Duration,
    /// Path used for liveness probes
    pub probe_path: String,
    /// Timeout for a single liveness probe
    pub probe_timeout: Duration,
    /// Interval between latency reorders
    pub reorder_interval: Duration,
    /// Interval between metrics reports
    pub metrics_interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            mode: DispatchMode::Sequential,
            timeout: Duration::from_millis(15_000),
            retry_attempts: 3,
            backoff_base: Duration::from_millis(2_000),
            jitter_max: Duration::from_millis(1_000),
            cache_ttl: Duration::from_secs(5 * 60),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            tunnel_bypass: true,
            failure_threshold: 0,
            failure_cooldown: Duration::from_secs(60),
            probe_path: "/ping".to_string(),
            probe_timeout: Duration::from_millis(3_000),
            reorder_interval: Duration::from_secs(2 * 60),
            metrics_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl DispatchConfig {
    /// Start building a config from defaults
    pub fn builder() -> DispatchConfigBuilder {
        DispatchConfigBuilder::default()
    }

    /// Enabled endpoints only, in configured order
    pub fn enabled_endpoints(&self) -> Vec<EndpointConfig> {
        self.endpoints.iter().filter(|e| e.enabled).cloned().collect()
    }

    /// Effective timeout for an endpoint
    pub fn timeout_for(&self, endpoint: &EndpointConfig) -> Duration {
        endpoint
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.timeout)
    }

    /// Check invariants the dispatcher relies on
    pub fn validate(&self) -> Result<()> {
        let enabled = self.enabled_endpoints();
        if enabled.is_empty() {
            return Err(ConfigError::NoEndpoints.into());
        }

        for endpoint in &enabled {
            validate_url(&endpoint.url)?;
            if self.timeout_for(endpoint).is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: "timeout_ms",
                    reason: format!("{}: must be greater than zero", endpoint.url),
                }
                .into());
            }
        }

        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_attempts",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }

        if self.probe_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "probe_timeout",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }

        if !self.probe_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "probe_path",
                reason: format!("'{}' must start with '/'", self.probe_path),
            }
            .into());
        }

        Ok(())
    }

    /// Overlay values from a config file
    pub fn apply_file(&mut self, file: &ConfigFile) {
        let s = &file.settings;
        self.mode = s.mode;
        self.timeout = Duration::from_millis(s.timeout_ms);
        self.retry_attempts = s.retry_attempts;
        self.backoff_base = Duration::from_millis(s.backoff_ms);
        self.jitter_max = Duration::from_millis(s.jitter_ms);
        self.cache_ttl = Duration::from_secs(s.cache_ttl_secs);
        self.tunnel_bypass = s.tunnel_bypass;
        self.failure_threshold = s.failure_threshold;
        self.failure_cooldown = Duration::from_secs(s.failure_cooldown_secs);
        self.probe_path = s.probe_path.clone();
        self.reorder_interval = Duration::from_secs(s.reorder_interval_secs);
        self.metrics_interval = Duration::from_secs(s.metrics_interval_secs);
        if let Some(reply) = &s.fallback_reply {
            self.fallback_reply = reply.clone();
        }

        if !file.endpoints.is_empty() {
            self.endpoints = file.endpoints.clone();
        }
        self.endpoints
            .retain(|e| !file.is_endpoint_disabled(&e.url));
    }
}

fn validate_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            url, other
        ))
        .into()),
    }
}

/// Builder for [`DispatchConfig`]
#[derive(Debug, Clone, Default)]
pub struct DispatchConfigBuilder {
    config: DispatchConfig,
    endpoints_set: bool,
}

impl DispatchConfigBuilder {
    /// Replace the endpoint list with plain URLs
    pub fn endpoints<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.endpoints = urls.into_iter().map(EndpointConfig::new).collect();
        self.endpoints_set = true;
        self
    }

    /// Append one endpoint; the first call drops the built-in list
    pub fn endpoint(mut self, endpoint: EndpointConfig) -> Self {
        if !self.endpoints_set {
            self.config.endpoints.clear();
            self.endpoints_set = true;
        }
        self.config.endpoints.push(endpoint);
        self
    }

    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_attempts = attempts;
        self
    }

    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.config.backoff_base = base;
        self
    }

    pub fn jitter_max(mut self, jitter: Duration) -> Self {
        self.config.jitter_max = jitter;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn fallback_reply(mut self, reply: impl Into<String>) -> Self {
        self.config.fallback_reply = reply.into();
        self
    }

    pub fn tunnel_bypass(mut self, enabled: bool) -> Self {
        self.config.tunnel_bypass = enabled;
        self
    }

    /// Skip an endpoint for `cooldown` after `threshold` consecutive failures
    pub fn failure_exclusion(mut self, threshold: u32, cooldown: Duration) -> Self {
        self.config.failure_threshold = threshold;
        self.config.failure_cooldown = cooldown;
        self
    }

    pub fn probe_path(mut self, path: impl Into<String>) -> Self {
        self.config.probe_path = path.into();
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    pub fn reorder_interval(mut self, interval: Duration) -> Self {
        self.config.reorder_interval = interval;
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.config.metrics_interval = interval;
        self
    }

    /// Validate and return the config
    pub fn build(self) -> Result<DispatchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
