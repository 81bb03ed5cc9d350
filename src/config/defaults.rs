//! Built-in backend endpoints
//!
//! The tunnel endpoints are tried first with short timeouts; the direct
//! playit.gg hosts are slower to answer and fall back to the global timeout.

use super::EndpointConfig;

/// Get the default endpoint list, in priority order
pub fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        EndpointConfig {
            url: "https://wrldrad.loca.lt".to_string(),
            timeout_ms: Some(5_000),
            note: Some("localtunnel, primary".to_string()),
            enabled: true,
        },
        EndpointConfig {
            url: "https://wrldrad24.loca.lt".to_string(),
            timeout_ms: Some(10_000),
            note: Some("localtunnel".to_string()),
            enabled: true,
        },
        EndpointConfig {
            url: "https://wrldrad1914.loca.lt".to_string(),
            timeout_ms: Some(20_000),
            note: Some("localtunnel".to_string()),
            enabled: true,
        },
        EndpointConfig {
            url: "http://22.ip.gl.ply.gg:18880".to_string(),
            timeout_ms: None,
            note: Some("playit.gg direct".to_string()),
            enabled: true,
        },
        EndpointConfig {
            url: "http://23.ip.gl.ply.gg:65329".to_string(),
            timeout_ms: None,
            note: Some("playit.gg direct".to_string()),
            enabled: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints_unique() {
        let endpoints = default_endpoints();
        let mut urls: Vec<_> = endpoints.iter().map(|e| e.url.as_str()).collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), endpoints.len());
        assert!(endpoints.iter().all(|e| e.enabled));
    }
}
