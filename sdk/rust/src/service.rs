//! Application-facing client: auth injection and failure signals.

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::Value;

use crate::auth::AuthStore;
use crate::config::ClientConfig;
use crate::envelope::Envelope;
use crate::request::{FilePart, MultipartPayload, RequestBody, RequestOptions};
use crate::signals::{ClientSignal, SignalBus};
use crate::transport::HttpClient;

/// Field name files are uploaded under.
pub const UPLOAD_FIELD: &str = "files";

const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Request client shared by the whole application.
///
/// Built once by the composition root with its collaborators; cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    auth: Arc<dyn AuthStore>,
    signals: Arc<dyn SignalBus>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, auth: Arc<dyn AuthStore>, signals: Arc<dyn SignalBus>) -> Self {
        Self::from_http(HttpClient::new(config), auth, signals)
    }

    pub fn from_http(http: HttpClient, auth: Arc<dyn AuthStore>, signals: Arc<dyn SignalBus>) -> Self {
        Self { http, auth, signals }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Perform a call. Emits `LogoutRequested` on a 401 (unless auth was
    /// skipped) and `DisplayError` on other failures (unless silenced).
    pub async fn request(&self, endpoint: &str, mut options: RequestOptions) -> Envelope {
        if !options.skip_auth {
            if let Some(token) = self.auth.token() {
                options.headers.push((AUTHORIZATION.as_str().to_string(), token));
            }
        }

        let envelope = self.http.request(endpoint, &options).await;

        if !envelope.is_success() {
            if let Some(error) = envelope.error() {
                if envelope.status() == Some(401) && !options.skip_auth {
                    let message = if error.is_empty() { SESSION_EXPIRED } else { error };
                    tracing::info!(endpoint, "Server rejected credentials, requesting logout");
                    self.signals.emit(ClientSignal::LogoutRequested {
                        message: message.to_string(),
                    });
                    return envelope;
                }
                if !options.skip_error_notification {
                    self.signals.emit(ClientSignal::DisplayError {
                        message: error.to_string(),
                    });
                }
            }
        }

        envelope
    }

    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Envelope {
        self.request(endpoint, with_method(options, Method::GET, None)).await
    }

    pub async fn post(&self, endpoint: &str, body: Option<Value>, options: RequestOptions) -> Envelope {
        self.request(endpoint, with_method(options, Method::POST, body)).await
    }

    pub async fn put(&self, endpoint: &str, body: Option<Value>, options: RequestOptions) -> Envelope {
        self.request(endpoint, with_method(options, Method::PUT, body)).await
    }

    pub async fn patch(&self, endpoint: &str, body: Option<Value>, options: RequestOptions) -> Envelope {
        self.request(endpoint, with_method(options, Method::PATCH, body)).await
    }

    pub async fn delete(&self, endpoint: &str, options: RequestOptions) -> Envelope {
        self.request(endpoint, with_method(options, Method::DELETE, None)).await
    }

    /// POST a multipart form with every file under `files` plus extra text fields.
    pub async fn upload_files(
        &self,
        endpoint: &str,
        files: Vec<FilePart>,
        fields: Vec<(String, String)>,
        options: RequestOptions,
    ) -> Envelope {
        let mut payload = MultipartPayload::new();
        for file in files {
            payload = payload.file(UPLOAD_FIELD, file);
        }
        for (name, value) in fields {
            payload = payload.text(name, value);
        }
        let mut options = options.method(Method::POST);
        options.body = Some(RequestBody::Multipart(payload));
        self.request(endpoint, options).await
    }

    /// Calls that never carry the auth header.
    pub fn public(&self) -> PublicApi<'_> {
        PublicApi { client: self }
    }
}

/// No-auth view of an `ApiClient`.
pub struct PublicApi<'a> {
    client: &'a ApiClient,
}

impl PublicApi<'_> {
    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Envelope {
        self.client.get(endpoint, options.skip_auth()).await
    }

    pub async fn post(&self, endpoint: &str, body: Option<Value>, options: RequestOptions) -> Envelope {
        self.client.post(endpoint, body, options.skip_auth()).await
    }
}

/// Convenience verbs own the method and, for body verbs, the body. A body
/// already present in `options` (form, bytes) is kept when `body` is `None`.
fn with_method(options: RequestOptions, method: Method, body: Option<Value>) -> RequestOptions {
    let mut options = options.method(method);
    match body {
        Some(value) => options.body = Some(RequestBody::Json(value)),
        None if options.method == Method::GET || options.method == Method::DELETE => {
            options.body = None;
        }
        None => {}
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_verbs_wrap_json() {
        let options = with_method(RequestOptions::new(), Method::POST, Some(json!({"a": 1})));
        assert_eq!(options.method, Method::POST);
        assert!(matches!(options.body, Some(RequestBody::Json(_))));
    }

    #[test]
    fn get_drops_any_body() {
        let options = with_method(RequestOptions::new().json(json!(1)), Method::GET, None);
        assert!(options.body.is_none());
    }

    #[test]
    fn post_keeps_form_body() {
        let options = with_method(
            RequestOptions::new().form([("username", "walter.bates")]),
            Method::POST,
            None,
        );
        assert!(matches!(options.body, Some(RequestBody::Form(_))));
    }
}
