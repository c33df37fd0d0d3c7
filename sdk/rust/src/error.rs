//! Transport-level failures and their retry classification.

use thiserror::Error;

/// Message used when the cancellation timer fires.
pub const TIMEOUT_MESSAGE: &str = "request timed out";

/// Number of body characters kept for diagnostics when JSON parsing fails.
pub const SNIPPET_CHARS: usize = 100;

/// A failure that prevented a response from being normalized.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The per-call timer fired before the response completed.
    #[error("request timed out")]
    Timeout,

    /// DNS, connect or protocol failure.
    #[error("network error while performing the request: {0}")]
    Network(#[source] reqwest::Error),

    /// The request could not be built (bad header, bad multipart mime).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The body claimed to be JSON but did not parse.
    #[error("could not parse the server's JSON response. Content: {snippet}...")]
    MalformedJson { status: u16, snippet: String },

    /// The body could not be read as text.
    #[error("could not read the server's text response")]
    ReadBody { status: u16 },
}

impl TransportError {
    /// HTTP status observed before the failure, if the exchange got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::MalformedJson { status, .. } | TransportError::ReadBody { status } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Timeouts, invalid requests and client errors fail fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout | TransportError::InvalidRequest(_) => false,
            _ => !self.status().is_some_and(is_client_error),
        }
    }
}

/// 400..=499.
pub fn is_client_error(status: u16) -> bool {
    (400..500).contains(&status)
}

/// First `SNIPPET_CHARS` characters of a body.
pub fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_CHARS).collect()
}
