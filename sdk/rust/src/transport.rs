//! HTTP client core.
//!
//! # Responsibilities
//! - Resolve the final URL (base + endpoint + query)
//! - Assemble headers (defaults, inferred content type, caller overrides)
//! - Serialize the body for each attempt
//! - Enforce the per-call timeout by dropping the in-flight future
//! - Retry transient failures with exponential backoff
//! - Parse and normalize the response into an `Envelope`
//!
//! # Design Decisions
//! - Timeouts and 4xx responses fail fast; 5xx, network failures and
//!   undecodable non-4xx bodies are retried while attempts remain
//! - An application failure (`success: false`) on a non-5xx status is final
//! - Auth and notifications live one layer up in `service.rs`

use std::borrow::Cow;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use url::form_urlencoded;

use crate::backoff::backoff_delay;
use crate::config::ClientConfig;
use crate::envelope::{Envelope, ResponseBody};
use crate::error::{snippet, TransportError};
use crate::request::{QueryValue, RequestBody, RequestOptions};

/// Outbound HTTP client producing normalized envelopes.
#[derive(Debug, Clone)]
pub struct HttpClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        if config.base_url.is_empty() {
            tracing::warn!("HttpClient initialized without base URL");
        }
        Self::with_client(config, reqwest::Client::new())
    }

    /// Use a preconfigured `reqwest::Client` (proxies, TLS roots, pools).
    pub fn with_client(config: ClientConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL without trailing slash, endpoint with a leading slash, and the
    /// non-null query parameters url-encoded in order. Full `http(s)://`
    /// endpoints bypass the base URL.
    pub fn build_url(&self, endpoint: &str, query: &[(String, QueryValue)]) -> String {
        let mut url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            let base = self.config.base_url.trim_end_matches('/');
            let path: Cow<'_, str> = if endpoint.starts_with('/') {
                Cow::Borrowed(endpoint)
            } else {
                Cow::Owned(format!("/{endpoint}"))
            };
            format!("{base}{path}")
        };

        let mut pairs = query.iter().filter(|(_, value)| !value.is_null()).peekable();
        if pairs.peek().is_some() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs.map(|(key, value)| (key.as_str(), value.to_string())))
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }
        url
    }

    /// Default headers, then the body's content type, then caller headers.
    /// Later entries replace earlier ones with the same name.
    pub fn build_headers(&self, options: &RequestOptions) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.config.default_headers {
            insert_header(&mut headers, name, value)?;
        }
        if let Some(content_type) = options.body.as_ref().and_then(RequestBody::inferred_content_type) {
            insert_header(&mut headers, CONTENT_TYPE.as_str(), content_type)?;
        }
        for (name, value) in &options.headers {
            insert_header(&mut headers, name, value)?;
        }
        Ok(headers)
    }

    /// Execute a call with retries. Never fails: every outcome is an `Envelope`.
    pub async fn request(&self, endpoint: &str, options: &RequestOptions) -> Envelope {
        let url = self.build_url(endpoint, &options.query);
        let headers = match self.build_headers(options) {
            Ok(headers) => headers,
            Err(e) => return Envelope::network_failure(e.to_string()),
        };
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let attempts = options.retries.unwrap_or(self.config.retries).max(1);

        let mut attempt = 0;
        loop {
            tracing::debug!(
                method = %options.method,
                url = %url,
                attempt = attempt + 1,
                "Sending request"
            );

            let outcome = self.attempt(&url, &headers, options, timeout).await;
            let (envelope, retryable) = match outcome {
                Ok(envelope) => {
                    let retryable = !envelope.is_success()
                        && envelope.status().is_some_and(|status| status >= 500);
                    (envelope, retryable)
                }
                Err(e) => {
                    tracing::warn!(url = %url, attempt = attempt + 1, error = %e, "Request failed");
                    let retryable = e.is_retryable();
                    (Envelope::failure(e.to_string(), e.status()), retryable)
                }
            };

            if !retryable || attempt + 1 >= attempts {
                return envelope;
            }

            let delay = backoff_delay(attempt, self.config.backoff_base);
            tracing::info!(
                url = %url,
                attempt = attempt + 1,
                delay = ?delay,
                status = ?envelope.status(),
                "Retrying request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        url: &str,
        headers: &HeaderMap,
        options: &RequestOptions,
        timeout: Duration,
    ) -> Result<Envelope, TransportError> {
        let mut builder = self
            .client
            .request(options.method.clone(), url)
            .headers(headers.clone());

        builder = match &options.body {
            None => builder,
            Some(RequestBody::Json(value)) => {
                let payload = serde_json::to_vec(value)
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                builder.body(payload)
            }
            Some(RequestBody::Form(pairs)) => {
                let encoded = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                builder.body(encoded)
            }
            Some(RequestBody::Multipart(payload)) => {
                let form = payload
                    .to_form()
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
                builder.multipart(form)
            }
            Some(RequestBody::Bytes { data, .. }) => builder.body(data.clone()),
        };

        let exchange = async {
            let response = builder.send().await.map_err(TransportError::Network)?;
            read_response(response).await
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

async fn read_response(response: reqwest::Response) -> Result<Envelope, TransportError> {
    let status = response.status().as_u16();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));

    let text = response
        .text()
        .await
        .map_err(|_| TransportError::ReadBody { status })?;

    let value = if !is_json {
        Value::String(text)
    } else if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(status, error = %e, "Error parsing JSON response");
            TransportError::MalformedJson {
                status,
                snippet: snippet(&text),
            }
        })?
    };

    Ok(Envelope::from_body(ResponseBody::classify(value), status))
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), TransportError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| TransportError::InvalidRequest(format!("header name '{name}': {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| TransportError::InvalidRequest(format!("header value for '{name}': {e}")))?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    use crate::request::MultipartPayload;

    fn client(base: &str) -> HttpClient {
        HttpClient::new(ClientConfig::new(base))
    }

    #[test]
    fn build_url_joins_base_and_endpoint() {
        let c = client("http://localhost:8081/");
        assert_eq!(c.build_url("api/users", &[]), "http://localhost:8081/api/users");
        assert_eq!(c.build_url("/api/users", &[]), "http://localhost:8081/api/users");
    }

    #[test]
    fn build_url_encodes_non_null_query() {
        let c = client("http://api");
        let query = vec![
            ("q".to_string(), QueryValue::from("a b&c")),
            ("skip".to_string(), QueryValue::Null),
            ("page".to_string(), QueryValue::from(2)),
        ];
        assert_eq!(c.build_url("/search", &query), "http://api/search?q=a+b%26c&page=2");
    }

    #[test]
    fn build_url_omits_question_mark_when_all_null() {
        let c = client("http://api");
        let query = vec![("skip".to_string(), QueryValue::Null)];
        assert_eq!(c.build_url("/x", &query), "http://api/x");
    }

    #[test]
    fn build_url_is_idempotent() {
        let c = client("http://api/");
        let query = vec![("f".to_string(), QueryValue::from("state=ready"))];
        assert_eq!(c.build_url("tasks", &query), c.build_url("tasks", &query));
    }

    #[test]
    fn build_url_keeps_full_urls() {
        let c = client("http://api");
        assert_eq!(c.build_url("https://other/x", &[]), "https://other/x");
    }

    #[test]
    fn json_body_sets_content_type_and_caller_wins() {
        let c = HttpClient::new(
            ClientConfig::new("http://api").with_default_header("Accept", "application/json"),
        );
        let options = RequestOptions::new()
            .json(json!({"a": 1}))
            .header("accept", "text/plain");
        let headers = c.build_headers(&options).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers["accept"], "text/plain");
    }

    #[test]
    fn binary_and_multipart_bodies_get_no_json_content_type() {
        let c = client("http://api");
        let raw = RequestOptions::new().body(RequestBody::Bytes {
            content_type: None,
            data: Bytes::from_static(b"raw"),
        });
        assert!(c.build_headers(&raw).unwrap().get(CONTENT_TYPE).is_none());

        let multipart = RequestOptions::new().body(RequestBody::Multipart(MultipartPayload::new()));
        assert!(c.build_headers(&multipart).unwrap().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn no_body_means_no_content_type() {
        let headers = client("http://api").build_headers(&RequestOptions::new()).unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn invalid_header_is_rejected() {
        let options = RequestOptions::new().header("bad header", "x");
        assert!(matches!(
            client("http://api").build_headers(&options),
            Err(TransportError::InvalidRequest(_))
        ));
    }
}
