//! Client configuration.

use std::time::Duration;

/// Environment variable holding the backend base URL.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

/// Configuration shared by every call made through an `HttpClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL that relative endpoints are appended to.
    pub base_url: String,

    /// Per-call timeout unless the call overrides it.
    pub timeout: Duration,

    /// Total attempts per call (1 = no retry) unless the call overrides it.
    pub retries: u32,

    /// Headers sent on every request before per-call headers are merged.
    pub default_headers: Vec<(String, String)>,

    /// Base of the exponential backoff between attempts.
    pub backoff_base: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_millis(30_000),
            retries: 1,
            default_headers: Vec::new(),
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with core defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults used by the application's composition root: two attempts and
    /// an `Accept: application/json` header.
    pub fn application(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            retries: 2,
            default_headers: vec![("Accept".to_string(), "application/json".to_string())],
            ..Self::default()
        }
    }

    /// Application defaults with the base URL taken from `API_BASE_URL`.
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_BASE_URL_ENV).unwrap_or_default();
        Self::application(base_url)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_defaults() {
        let config = ClientConfig::new("http://localhost:8081");
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert_eq!(config.retries, 1);
        assert!(config.default_headers.is_empty());
        assert_eq!(config.backoff_base, Duration::from_secs(1));
    }

    #[test]
    fn application_defaults_accept_json() {
        let config = ClientConfig::application("http://api");
        assert_eq!(config.retries, 2);
        assert_eq!(
            config.default_headers,
            vec![("Accept".to_string(), "application/json".to_string())]
        );
    }
}
