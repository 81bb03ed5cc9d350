//! Multi-endpoint message delivery with retries, racing and latency ordering

mod dispatcher;
mod endpoint;
mod health;
mod payload;
mod pool;
mod retry;

pub use dispatcher::Dispatcher;
pub use endpoint::{Endpoint, TUNNEL_BYPASS_HEADER};
pub use health::{EndpointHealth, HealthTracker};
pub use payload::{parse_reply, MessageRequest};
pub use pool::{sort_by_latency, EndpointPool, ProbeResult};
pub use retry::{random_jitter, retry_with_backoff, RetryPolicy, Retryable};
