//! A single chat backend

use super::payload::{parse_reply, MessageRequest};
use crate::config::EndpointConfig;
use crate::error::AttemptError;
use std::time::{Duration, Instant};

/// Header localtunnel requires to skip its interstitial page
pub const TUNNEL_BYPASS_HEADER: &str = "bypass-tunnel-reminder";

/// A backend endpoint bound to a shared HTTP client
#[derive(Debug, Clone)]
pub struct Endpoint {
    config: EndpointConfig,
    client: reqwest::Client,
    timeout: Duration,
    tunnel_bypass: bool,
}

impl Endpoint {
    pub fn new(
        config: EndpointConfig,
        client: reqwest::Client,
        timeout: Duration,
        tunnel_bypass: bool,
    ) -> Self {
        Self {
            config,
            client,
            timeout,
            tunnel_bypass,
        }
    }

    /// Base URL as configured
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Per-attempt timeout for this endpoint
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    fn message_url(&self) -> String {
        format!("{}/api/message", self.config.base_url())
    }

    /// One `POST /api/message` attempt.
    ///
    /// The timeout is attached to the request itself, so an attempt that runs
    /// out of time drops its connection instead of lingering.
    pub async fn post_message(&self, request: &MessageRequest) -> Result<String, AttemptError> {
        let timeout_ms = self.timeout.as_millis() as u64;

        let mut builder = self
            .client
            .post(self.message_url())
            .timeout(self.timeout)
            .json(request);
        if self.tunnel_bypass {
            builder = builder.header(TUNNEL_BYPASS_HEADER, "true");
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AttemptError::from_transport(&e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::from_status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AttemptError::from_transport(&e, timeout_ms))?;

        parse_reply(&body)
    }

    /// Liveness probe; returns the round-trip time on any 2xx
    pub async fn probe(&self, path: &str, timeout: Duration) -> Result<Duration, AttemptError> {
        let url = format!("{}{}", self.config.base_url(), path);
        let start = Instant::now();

        let mut builder = self.client.get(&url).timeout(timeout);
        if self.tunnel_bypass {
            builder = builder.header(TUNNEL_BYPASS_HEADER, "true");
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AttemptError::from_transport(&e, timeout.as_millis() as u64))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::from_status(status.as_u16()));
        }

        Ok(start.elapsed())
    }
}
