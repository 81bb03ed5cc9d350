//! chatwire - resilient chat message dispatcher
//!
//! A Rust library and CLI that delivers chat messages to a pool of backend
//! endpoints over HTTP, with sequential failover or concurrent racing,
//! per-attempt timeouts, retries with backoff, reply caching and
//! latency-based endpoint ordering.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatwire::{DispatchConfig, DispatchMode, Dispatcher};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DispatchConfig::builder()
//!         .endpoints(["https://chat-a.example.com", "https://chat-b.example.com"])
//!         .mode(DispatchMode::Race)
//!         .timeout(Duration::from_secs(10))
//!         .retry_attempts(3)
//!         .build()?;
//!
//!     let dispatcher = Dispatcher::new(config)?;
//!     let reply = dispatcher.send("hello").await;
//!
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod maintenance;
pub mod metrics;
pub mod rate_limit;
pub mod session;

// Re-exports for convenience
pub use cache::ResponseCache;
pub use config::{
    default_endpoints, ConfigFile, DispatchConfig, DispatchConfigBuilder, DispatchMode,
    EndpointConfig, DEFAULT_FALLBACK_REPLY,
};
pub use dispatch::{
    Dispatcher, Endpoint, EndpointHealth, EndpointPool, HealthTracker, MessageRequest,
    ProbeResult, RetryPolicy,
};
pub use error::{AttemptError, ConfigError, Error, Result, SessionError};
pub use identity::{jid_from_ip, IdentityResolver};
pub use maintenance::Maintenance;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use rate_limit::RateLimiter;
pub use session::{format_for_server, ChatSession, Role, Turn};
