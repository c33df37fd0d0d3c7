//! Relay failures and their wire representation.
//!
//! Every failure the relay itself produces is a `500` with
//! `{"error": "proxy error", "details": "<message>"}`. Upstream error
//! statuses are never wrapped; they are relayed verbatim by the handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error payload label.
pub const PROXY_ERROR: &str = "proxy error";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not answer within {0}s")]
    Timeout(u64),

    #[error("invalid upstream URI: {0}")]
    InvalidUri(String),

    #[error("failed to read body: {0}")]
    ReadBody(String),

    #[error("invalid {content_type} body: {reason}")]
    InvalidBody {
        content_type: &'static str,
        reason: String,
    },

    #[error("upstream login succeeded without issuing session credentials")]
    MissingCredentials,

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] axum::http::header::InvalidHeaderName),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),
}

impl RelayError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Upstream(_) => "upstream",
            RelayError::Timeout(_) => "timeout",
            RelayError::InvalidUri(_) => "invalid_uri",
            RelayError::ReadBody(_) => "read_body",
            RelayError::InvalidBody { .. } => "invalid_body",
            RelayError::MissingCredentials => "missing_credentials",
            RelayError::InvalidHeader(_) | RelayError::InvalidHeaderName(_) | RelayError::Request(_) => {
                "request"
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": PROXY_ERROR, "details": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_proxy_error_payload() {
        let response = RelayError::Timeout(25).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "proxy error");
        assert_eq!(value["details"], "upstream did not answer within 25s");
    }
}
