//! Session identity derived from the client's public IP
//!
//! The backend correlates sessions by a `jid`: the IP's digits concatenated
//! with a fixed suffix. Lookup failure is not fatal; messages are then sent
//! without a `jid`.

use crate::error::Result;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Public IP lookup service
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

/// Suffix appended to the IP digits
pub const DEFAULT_JID_SUFFIX: &str = "@s.whatsapp.net";

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// Build a `jid` from an IP string. Returns `None` if it has no digits.
pub fn jid_from_ip(ip: &str, suffix: &str) -> Option<String> {
    let digits: String = ip.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!("{}{}", digits, suffix))
}

/// Resolves and memoises the public IP for the life of the process
#[derive(Debug)]
pub struct IdentityResolver {
    http: Option<reqwest::Client>,
    lookup_url: String,
    jid_suffix: String,
    ip: OnceCell<String>,
}

impl IdentityResolver {
    pub fn new(lookup_url: impl Into<String>, jid_suffix: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http: Some(http),
            lookup_url: lookup_url.into(),
            jid_suffix: jid_suffix.into(),
            ip: OnceCell::new(),
        })
    }

    /// A resolver that never looks anything up
    pub fn disabled() -> Self {
        Self {
            http: None,
            lookup_url: String::new(),
            jid_suffix: DEFAULT_JID_SUFFIX.to_string(),
            ip: OnceCell::new(),
        }
    }

    /// A resolver pinned to a known IP
    pub fn fixed(ip: impl Into<String>, jid_suffix: impl Into<String>) -> Self {
        Self {
            http: None,
            lookup_url: String::new(),
            jid_suffix: jid_suffix.into(),
            ip: OnceCell::new_with(Some(ip.into())),
        }
    }

    /// Public IP, looked up on first use. Failures are not cached, so a later
    /// call tries again.
    pub async fn public_ip(&self) -> Option<String> {
        let Some(http) = &self.http else {
            return self.ip.get().cloned();
        };

        let result = self
            .ip
            .get_or_try_init(|| async {
                let response = http
                    .get(&self.lookup_url)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;
                if !response.status().is_success() {
                    return Err(format!("HTTP {}", response.status()));
                }
                let body: IpResponse = response.json().await.map_err(|e| e.to_string())?;
                tracing::debug!("Resolved public IP {}", body.ip);
                Ok(body.ip)
            })
            .await;

        match result {
            Ok(ip) => Some(ip.clone()),
            Err(e) => {
                tracing::warn!("Failed to fetch public IP: {}", e);
                None
            }
        }
    }

    /// Session `jid`, if the IP is known
    pub async fn jid(&self) -> Option<String> {
        let ip = self.public_ip().await?;
        jid_from_ip(&ip, &self.jid_suffix)
    }
}
