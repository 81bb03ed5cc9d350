//! Error types for chatwire

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client construction or transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Classified failure of one request to one endpoint.
///
/// These never cross the dispatcher boundary; they decide whether the same
/// endpoint is retried and are logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("connection failed: {0}")]
    Network(String),

    #[error("server error: HTTP {0}")]
    Server(u16),

    #[error("client error: HTTP {0}")]
    Client(u16),

    #[error("unexpected status: HTTP {0}")]
    UnexpectedStatus(u16),

    #[error("backend rejected message: {0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl AttemptError {
    /// Whether the same endpoint should be tried again.
    ///
    /// Client errors and explicit backend rejections are presumed to be about
    /// the payload, so they move straight on to the next endpoint.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AttemptError::Timeout(_)
                | AttemptError::Network(_)
                | AttemptError::Server(_)
                | AttemptError::Malformed(_)
        )
    }

    /// Classify a transport-level reqwest error
    pub fn from_transport(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            AttemptError::Timeout(timeout_ms)
        } else if err.is_decode() {
            AttemptError::Malformed(err.to_string())
        } else {
            AttemptError::Network(err.to_string())
        }
    }

    /// Classify a non-success HTTP status. Only 5xx is worth another try; a
    /// 3xx the client did not follow is treated like a client error.
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => AttemptError::Client(status),
            500..=599 => AttemptError::Server(status),
            _ => AttemptError::UnexpectedStatus(status),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config file: {0}")]
    InvalidFile(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("No enabled endpoints configured")]
    NoEndpoints,

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Config file parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Reasons a chat session refuses to dispatch user input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Too many requests. Please try again later.")]
    RateLimited,
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(AttemptError::Timeout(100).is_retryable());
        assert!(AttemptError::Network("refused".into()).is_retryable());
        assert!(AttemptError::Server(503).is_retryable());
        assert!(AttemptError::Malformed("not json".into()).is_retryable());

        assert!(!AttemptError::Client(400).is_retryable());
        assert!(!AttemptError::Rejected("bad".into()).is_retryable());
        assert!(!AttemptError::UnexpectedStatus(301).is_retryable());
    }

    #[test]
    fn test_from_status() {
        assert_eq!(AttemptError::from_status(400), AttemptError::Client(400));
        assert_eq!(AttemptError::from_status(404), AttemptError::Client(404));
        assert_eq!(AttemptError::from_status(500), AttemptError::Server(500));
        assert_eq!(AttemptError::from_status(502), AttemptError::Server(502));
        assert_eq!(AttemptError::from_status(599), AttemptError::Server(599));
        assert_eq!(
            AttemptError::from_status(302),
            AttemptError::UnexpectedStatus(302)
        );
        assert_eq!(
            AttemptError::from_status(600),
            AttemptError::UnexpectedStatus(600)
        );
        assert!(!AttemptError::from_status(302).is_retryable());
        assert!(!AttemptError::from_status(304).is_retryable());
    }
}
