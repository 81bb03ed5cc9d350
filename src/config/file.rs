//! Configuration file handling

use super::{DispatchMode, EndpointConfig};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Global dispatch settings
    #[serde(default)]
    pub settings: Settings,

    /// Custom endpoints (replace the built-in list when non-empty)
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    /// Disabled endpoints
    #[serde(default)]
    pub disabled_endpoints: DisabledEndpoints,

    /// Session identity
    #[serde(default)]
    pub identity: IdentitySettings,

    /// Per-user rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

/// Global settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Dispatch mode
    #[serde(default)]
    pub mode: DispatchMode,

    /// Per-attempt timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per endpoint
    #[serde(default = "default_retries")]
    pub retry_attempts: u32,

    /// Backoff base in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Max jitter in milliseconds
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Reply cache TTL in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Override for the exhaustion reply
    #[serde(default)]
    pub fallback_reply: Option<String>,

    /// Send the localtunnel bypass header
    #[serde(default = "default_true")]
    pub tunnel_bypass: bool,

    /// Consecutive failures before an endpoint is skipped (0 disables)
    #[serde(default)]
    pub failure_threshold: u32,

    /// Skip duration for failing endpoints, in seconds
    #[serde(default = "default_failure_cooldown_secs")]
    pub failure_cooldown_secs: u64,

    /// Liveness probe path
    #[serde(default = "default_probe_path")]
    pub probe_path: String,

    /// Latency reorder interval in seconds
    #[serde(default = "default_reorder_interval_secs")]
    pub reorder_interval_secs: u64,

    /// Metrics report interval in seconds
    #[serde(default = "default_metrics_interval_secs")]
    pub metrics_interval_secs: u64,
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    2_000
}

fn default_jitter_ms() -> u64 {
    1_000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_failure_cooldown_secs() -> u64 {
    60
}

fn default_probe_path() -> String {
    "/ping".to_string()
}

fn default_reorder_interval_secs() -> u64 {
    120
}

fn default_metrics_interval_secs() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retries(),
            backoff_ms: default_backoff_ms(),
            jitter_ms: default_jitter_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            fallback_reply: None,
            tunnel_bypass: true,
            failure_threshold: 0,
            failure_cooldown_secs: default_failure_cooldown_secs(),
            probe_path: default_probe_path(),
            reorder_interval_secs: default_reorder_interval_secs(),
            metrics_interval_secs: default_metrics_interval_secs(),
        }
    }
}

/// Disabled endpoints configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisabledEndpoints {
    /// List of URLs to disable
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Session identity settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Attach a `jid` derived from the public IP
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Public IP lookup service
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Suffix appended to the IP digits
    #[serde(default = "default_jid_suffix")]
    pub jid_suffix: String,

    /// Prefix added to messages that are not slash commands (empty disables)
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_ip_lookup_url() -> String {
    crate::identity::DEFAULT_IP_LOOKUP_URL.to_string()
}

fn default_jid_suffix() -> String {
    crate::identity::DEFAULT_JID_SUFFIX.to_string()
}

fn default_command_prefix() -> String {
    crate::session::DEFAULT_COMMAND_PREFIX.to_string()
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ip_lookup_url: default_ip_lookup_url(),
            jid_suffix: default_jid_suffix(),
            command_prefix: default_command_prefix(),
        }
    }
}

/// Rate limit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Messages allowed per window
    #[serde(default = "default_rate_limit")]
    pub limit: usize,

    /// Window length in seconds
    #[serde(default = "default_rate_window_secs")]
    pub window_secs: u64,
}

fn default_rate_limit() -> usize {
    5
}

fn default_rate_window_secs() -> u64 {
    60
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            limit: default_rate_limit(),
            window_secs: default_rate_window_secs(),
        }
    }
}

impl ConfigFile {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatwire")
            .join("config.toml")
    }

    /// Load from a specific path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidFile(format!("{}: {}", path.display(), e)))?;

        let config: Self = toml::from_str(&content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Save to a specific path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::InvalidFile(format!("Failed to create directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidFile(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::InvalidFile(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Check if an endpoint URL is disabled
    pub fn is_endpoint_disabled(&self, url: &str) -> bool {
        self.disabled_endpoints.urls.iter().any(|u| u == url)
    }
}
