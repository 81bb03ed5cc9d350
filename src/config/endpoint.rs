//! Backend endpoint configuration

use serde::{Deserialize, Serialize};

/// Configuration for a single chat backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL (origin) of the backend
    pub url: String,
    /// Per-attempt timeout override in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Optional note about the endpoint
    #[serde(default)]
    pub note: Option<String>,
    /// Whether this endpoint is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl EndpointConfig {
    /// Create a new endpoint config with defaults
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            note: None,
            enabled: true,
        }
    }

    /// Builder-style setter for the timeout override
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Builder-style setter for note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Builder-style setter for enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Base URL without a trailing slash, so paths can be appended directly
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_config() {
        let config = EndpointConfig::new("https://example.com")
            .with_timeout_ms(5_000)
            .with_note("primary");

        assert_eq!(config.url, "https://example.com");
        assert_eq!(config.timeout_ms, Some(5_000));
        assert_eq!(config.note.as_deref(), Some("primary"));
        assert!(config.enabled);
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let config = EndpointConfig::new("http://localhost:8080/");
        assert_eq!(config.base_url(), "http://localhost:8080");

        let config = EndpointConfig::new("http://localhost:8080");
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: EndpointConfig = toml::from_str(r#"url = "https://a.example""#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.timeout_ms, None);
    }
}
