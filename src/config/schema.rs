//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the session relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// The BPM service requests are relayed to.
    pub upstream: UpstreamConfig,

    /// Session-handle store settings.
    pub sessions: SessionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cross-origin settings for the browser application.
    pub cors: CorsConfig,

    /// Hardening and credential exposure policy.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Upstream BPM service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream origin plus base path (e.g., "http://localhost:8080/bonita").
    pub base_url: String,

    /// Local path prefix that is relayed; stripped before forwarding.
    pub path_prefix: String,

    /// Upstream path (after prefix stripping) that opens a session.
    pub login_path: String,

    /// Upstream path that closes a session.
    pub logout_path: String,

    /// Header the upstream expects the API token in.
    pub token_header: String,

    /// Cookie carrying the upstream session identifier.
    pub session_cookie: String,

    /// Cookie carrying the upstream API token on login.
    pub token_cookie: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/bonita".to_string(),
            path_prefix: "/bonita".to_string(),
            login_path: "/loginservice".to_string(),
            logout_path: "/logoutservice".to_string(),
            token_header: "X-Bonita-API-Token".to_string(),
            session_cookie: "JSESSIONID".to_string(),
            token_cookie: "X-Bonita-API-Token".to_string(),
        }
    }
}

/// Session-handle store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Request header the browser presents its handle in.
    pub client_id_header: String,

    /// Idle time after which a handle expires, in seconds.
    pub ttl_secs: u64,

    /// Maximum number of live handles.
    pub max_entries: usize,

    /// Interval of the background expiry sweep, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_id_header: "x-client-id".to_string(),
            ttl_secs: 30 * 60,
            max_entries: 10_000,
            sweep_interval_secs: 60,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for an inbound request, in seconds.
    pub request_secs: u64,

    /// Time allowed for the upstream exchange, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 25,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the relay with credentials.
    pub allowed_origins: Vec<String>,

    /// Allow cookies / auth headers on cross-origin calls.
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            allow_credentials: true,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Surface the upstream token and Set-Cookie headers to the browser on
    /// relayed responses. Off by default: the browser only ever holds its
    /// client id.
    pub expose_upstream_credentials: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
            expose_upstream_credentials: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
