//! Relay request handling.
//!
//! # Data Flow
//! ```text
//! browser request under the upstream prefix
//!     → strip prefix, keep query
//!     → filter headers, attach upstream token + session cookie for a known client id
//!     → re-encode body by content type
//!     → forward with the upstream deadline
//!     → login:     register credentials, answer {"clientId": ...}
//!       logout:    revoke the handle, relay the response
//!       otherwise: relay status, headers and body
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use serde_json::json;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::relay::body::encode_body;
use crate::relay::credentials::{
    extract_credentials, forwardable_request_headers, strip_hop_by_hop, strip_upstream_credentials,
};
use crate::relay::session::SessionStore;
use crate::resilience::timeouts::with_timeout;

/// Upstream HTTP client.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// State shared by the relay handlers.
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<RelayConfig>,
    pub sessions: SessionStore,
    pub client: UpstreamClient,
}

/// What a relayed request is, judged by its upstream path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    Login,
    Logout,
    Plain,
}

pub async fn relay_handler(State(state): State<RelayState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Relaying request"
    );

    match relay(&state, request).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                status = response.status().as_u16(),
                elapsed = ?start.elapsed(),
                "Relay completed"
            );
            metrics::record_request(method.as_str(), response.status().as_u16(), start);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %e,
                "Relay failed"
            );
            metrics::record_upstream_error(e.kind());
            metrics::record_request(method.as_str(), StatusCode::INTERNAL_SERVER_ERROR.as_u16(), start);
            e.into_response()
        }
    }
}

pub async fn health_handler(State(state): State<RelayState>) -> impl IntoResponse {
    Json(json!({ "status": "UP", "sessions": state.sessions.len() }))
}

async fn relay(state: &RelayState, request: Request<Body>) -> Result<Response, RelayError> {
    let config = &state.config;
    let upstream = &config.upstream;
    let (parts, body) = request.into_parts();

    let upstream_path = strip_prefix(parts.uri.path(), &upstream.path_prefix);
    let exchange = if upstream_path == upstream.login_path && parts.method == Method::POST {
        Exchange::Login
    } else if upstream_path == upstream.logout_path {
        Exchange::Logout
    } else {
        Exchange::Plain
    };
    let uri = upstream_uri(&upstream.base_url, upstream_path, parts.uri.query())?;

    let client_id = parts
        .headers
        .get(config.sessions.client_id_header.as_str())
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let mut headers = forwardable_request_headers(&parts.headers, &config.sessions.client_id_header);
    if exchange != Exchange::Login {
        if let Some(credentials) = client_id.as_deref().and_then(|id| state.sessions.resolve(id)) {
            headers.insert(
                header::HeaderName::from_bytes(upstream.token_header.as_bytes())?,
                HeaderValue::from_str(&credentials.token)?,
            );
            headers.insert(
                header::COOKIE,
                HeaderValue::from_str(&format!("{}={}", upstream.session_cookie, credentials.session_id))?,
            );
        }
    }

    let raw = axum::body::to_bytes(body, config.security.max_body_size)
        .await
        .map_err(|e| RelayError::ReadBody(e.to_string()))?;
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let encoded = encode_body(&parts.method, content_type, raw)?;

    let mut outbound = Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .body(encoded.map(Body::from).unwrap_or_else(Body::empty))?;
    *outbound.headers_mut() = headers;

    let response = with_timeout(config.timeouts.upstream_secs, async {
        state.client.request(outbound).await.map_err(RelayError::from)
    })
    .await?;
    let (mut response_parts, response_body) = response.into_parts();

    match exchange {
        Exchange::Login if response_parts.status.is_success() => {
            let credentials =
                extract_credentials(&response_parts.headers, upstream).ok_or(RelayError::MissingCredentials)?;
            let client_id = state.sessions.register(credentials);
            tracing::info!(sessions = state.sessions.len(), "Upstream login relayed, session handle issued");
            return Ok((StatusCode::OK, Json(json!({ "clientId": client_id }))).into_response());
        }
        Exchange::Logout => {
            if let Some(id) = client_id.as_deref() {
                if state.sessions.revoke(id) {
                    tracing::info!(sessions = state.sessions.len(), "Session handle revoked on logout");
                }
            }
        }
        _ => {}
    }

    strip_hop_by_hop(&mut response_parts.headers);
    if config.security.expose_upstream_credentials && exchange != Exchange::Login {
        expose_credentials(&mut response_parts.headers, &upstream.token_header)?;
    } else {
        strip_upstream_credentials(&mut response_parts.headers, upstream);
    }

    Ok(Response::from_parts(response_parts, Body::new(response_body)))
}

/// Path below the prefix; `"/bonita"` and `"/bonita/"` both map to `"/"`.
fn strip_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

fn upstream_uri(base_url: &str, path: &str, query: Option<&str>) -> Result<Uri, RelayError> {
    let mut target = format!("{}{}", base_url.trim_end_matches('/'), path);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target
        .parse::<Uri>()
        .map_err(|e| RelayError::InvalidUri(format!("{target}: {e}")))
}

fn expose_credentials(headers: &mut HeaderMap, token_header: &str) -> Result<(), RelayError> {
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_str(&format!("{token_header}, Set-Cookie"))?,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_stripped_on_segment_boundary() {
        assert_eq!(strip_prefix("/bonita/API/bpm/process", "/bonita"), "/API/bpm/process");
        assert_eq!(strip_prefix("/bonita", "/bonita"), "/");
        assert_eq!(strip_prefix("/bonita/", "/bonita/"), "/");
        assert_eq!(strip_prefix("/bonitax", "/bonita"), "/bonitax");
    }

    #[test]
    fn upstream_uri_keeps_query() {
        let uri = upstream_uri("http://localhost:8080/bonita/", "/API/bpm/case", Some("p=0&c=10")).unwrap();
        assert_eq!(uri.to_string(), "http://localhost:8080/bonita/API/bpm/case?p=0&c=10");
    }

    #[test]
    fn expose_directive_names_token_header() {
        let mut headers = HeaderMap::new();
        expose_credentials(&mut headers, "X-Bonita-API-Token").unwrap();
        assert_eq!(
            headers[header::ACCESS_CONTROL_EXPOSE_HEADERS],
            "X-Bonita-API-Token, Set-Cookie"
        );
    }
}
