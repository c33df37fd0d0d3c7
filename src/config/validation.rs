//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacity > 0)
//! - Check addresses, URLs, prefixes and origins parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::RelayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("upstream.base_url '{0}' must be an absolute http URL")]
    UpstreamUrl(String),

    #[error("{field} '{value}' must start with '/'")]
    Path { field: &'static str, value: String },

    #[error("upstream.path_prefix must not be '/'")]
    RootPrefix,

    #[error("{0} must be a valid header name")]
    HeaderName(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("timeouts.request_secs ({request_secs}) must exceed timeouts.upstream_secs ({upstream_secs})")]
    TimeoutOrder { request_secs: u64, upstream_secs: u64 },

    #[error("cors.allowed_origins entry '{0}' is not a valid origin")]
    Origin(String),
}

/// Check everything serde cannot.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let upstream = &config.upstream;
    match url::Url::parse(&upstream.base_url) {
        Ok(url) if url.scheme() == "http" && url.has_host() => {}
        _ => errors.push(ValidationError::UpstreamUrl(upstream.base_url.clone())),
    }

    for (field, value) in [
        ("upstream.path_prefix", &upstream.path_prefix),
        ("upstream.login_path", &upstream.login_path),
        ("upstream.logout_path", &upstream.logout_path),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::Path {
                field,
                value: value.clone(),
            });
        }
    }
    if upstream.path_prefix.trim_end_matches('/').is_empty() && upstream.path_prefix.starts_with('/') {
        errors.push(ValidationError::RootPrefix);
    }

    for (field, value) in [
        ("upstream.token_header", &upstream.token_header),
        ("sessions.client_id_header", &config.sessions.client_id_header),
    ] {
        if axum::http::HeaderName::from_bytes(value.as_bytes()).is_err() {
            errors.push(ValidationError::HeaderName(field));
        }
    }

    for (field, value) in [
        ("sessions.ttl_secs", config.sessions.ttl_secs),
        ("sessions.max_entries", config.sessions.max_entries as u64),
        ("sessions.sweep_interval_secs", config.sessions.sweep_interval_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("security.max_body_size", config.security.max_body_size as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    let timeouts = &config.timeouts;
    if timeouts.upstream_secs > 0 && timeouts.request_secs <= timeouts.upstream_secs {
        errors.push(ValidationError::TimeoutOrder {
            request_secs: timeouts.request_secs,
            upstream_secs: timeouts.upstream_secs,
        });
    }

    for origin in &config.cors.allowed_origins {
        if origin == "*" || HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
