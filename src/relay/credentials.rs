//! Upstream credential extraction and header hygiene.

use axum::http::{header, HeaderMap, HeaderName};

use crate::config::UpstreamConfig;
use crate::relay::session::UpstreamCredentials;

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Value of cookie `name` from a single `Set-Cookie` line.
pub fn cookie_value<'a>(set_cookie: &'a str, name: &str) -> Option<&'a str> {
    let pair = set_cookie.split(';').next()?.trim();
    let (key, value) = pair.split_once('=')?;
    (key.trim() == name).then(|| value.trim())
}

/// Session id and API token issued by an upstream login response.
///
/// The session id comes from the session cookie. The token comes from the
/// token cookie, or from the token header when no such cookie is set.
/// Both must be present and non-empty.
pub fn extract_credentials(headers: &HeaderMap, upstream: &UpstreamConfig) -> Option<UpstreamCredentials> {
    let mut session_id = None;
    let mut token = None;

    for line in headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
    {
        if let Some(value) = cookie_value(line, &upstream.session_cookie) {
            session_id = Some(value.to_string());
        }
        if let Some(value) = cookie_value(line, &upstream.token_cookie) {
            token = Some(value.to_string());
        }
    }

    if token.as_deref().map_or(true, str::is_empty) {
        token = headers
            .get(upstream.token_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
    }

    match (session_id, token) {
        (Some(session_id), Some(token)) if !session_id.is_empty() && !token.is_empty() => {
            Some(UpstreamCredentials { session_id, token })
        }
        _ => None,
    }
}

/// Request headers to forward: everything except host, content-length,
/// hop-by-hop headers and the relay's own client-id header.
pub fn forwardable_request_headers(headers: &HeaderMap, client_id_header: &str) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if name == header::HOST
            || name == header::CONTENT_LENGTH
            || is_hop_by_hop(name)
            || name.as_str().eq_ignore_ascii_case(client_id_header)
        {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

/// Drop hop-by-hop headers from an upstream response in place.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Drop the upstream session cookie and token header from a response.
pub fn strip_upstream_credentials(headers: &mut HeaderMap, upstream: &UpstreamConfig) {
    headers.remove(header::SET_COOKIE);
    headers.remove(upstream.token_header.as_str());
}
