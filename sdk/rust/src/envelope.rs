//! Uniform result of every client call.
//!
//! # Normalization
//! ```text
//! parsed body
//!     → matches {success: bool, ...}?  → ResponseBody::Standard → backend flag decides
//!     → otherwise                      → ResponseBody::Raw      → HTTP status decides
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The standardized backend envelope `{success, data?, message?, code?, details?}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackendEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

/// A parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Standard(BackendEnvelope),
    Raw(Value),
}

impl ResponseBody {
    /// Try the standardized envelope schema first, fall back to the raw value.
    pub fn classify(value: Value) -> Self {
        if value.get("success").is_some_and(Value::is_boolean) {
            match serde_json::from_value::<BackendEnvelope>(value.clone()) {
                Ok(envelope) => return ResponseBody::Standard(envelope),
                Err(e) => {
                    tracing::debug!(error = %e, "Body has a success flag but is not a backend envelope");
                }
            }
        }
        ResponseBody::Raw(value)
    }
}

/// Result of a client call.
///
/// A successful envelope never carries an error and a failed one never carries
/// data; the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    data: Option<Value>,
    error: Option<String>,
    status: Option<u16>,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl Envelope {
    /// Successful result. A JSON `null` payload is stored as absent.
    pub fn ok(data: Value, status: u16) -> Self {
        Self {
            data: non_null(data),
            error: None,
            status: Some(status),
            success: true,
            code: None,
            details: None,
        }
    }

    /// Failed result with an HTTP status.
    pub fn failure(error: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
            status,
            success: false,
            code: None,
            details: None,
        }
    }

    /// Failed result with no HTTP exchange behind it (DNS, connect, timeout).
    pub fn network_failure(error: impl Into<String>) -> Self {
        Self::failure(error, None)
    }

    /// Normalize a parsed body received with `status`.
    pub fn from_body(body: ResponseBody, status: u16) -> Self {
        match body {
            ResponseBody::Standard(backend) => {
                let mut envelope = if backend.success {
                    Self::ok(backend.data.unwrap_or(Value::Null), status)
                } else {
                    let message = backend
                        .message
                        .unwrap_or_else(|| format!("request failed (status {status})"));
                    Self::failure(message, Some(status))
                };
                envelope.code = backend.code;
                envelope.details = backend.details;
                envelope
            }
            ResponseBody::Raw(value) => {
                if (200..300).contains(&status) {
                    Self::ok(value, status)
                } else {
                    let message = match value {
                        Value::String(s) if !s.is_empty() => s,
                        Value::Null | Value::String(_) => server_error_message(status),
                        other => other.to_string(),
                    };
                    Self::failure(message, Some(status))
                }
            }
        }
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Value> {
        self.data
    }

    /// Deserialize the payload into `T`. `None` when there is no payload.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.data.clone().map(serde_json::from_value)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }
}

fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other),
    }
}

fn server_error_message(status: u16) -> String {
    format!("server error (status {status})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn standardized_failure_takes_precedence_over_http_ok() {
        let body = ResponseBody::classify(json!({
            "success": false,
            "message": "Invalid credentials",
            "code": "AUTH_001"
        }));
        let envelope = Envelope::from_body(body, 200);
        assert!(!envelope.is_success());
        assert_eq!(envelope.error(), Some("Invalid credentials"));
        assert_eq!(envelope.code(), Some("AUTH_001"));
        assert_eq!(envelope.status(), Some(200));
        assert!(envelope.data().is_none());
    }

    #[test]
    fn standardized_success_on_error_status_is_success() {
        let body = ResponseBody::classify(json!({"success": true, "data": {"id": 7}}));
        let envelope = Envelope::from_body(body, 500);
        assert!(envelope.is_success());
        assert_eq!(envelope.data(), Some(&json!({"id": 7})));
        assert!(envelope.error().is_none());
    }

    #[test]
    fn standardized_failure_without_message_gets_fallback() {
        let body = ResponseBody::classify(json!({"success": false}));
        let envelope = Envelope::from_body(body, 422);
        assert_eq!(envelope.error(), Some("request failed (status 422)"));
    }

    #[test]
    fn non_boolean_success_field_is_raw() {
        let body = ResponseBody::classify(json!({"success": "yes", "data": 1}));
        assert!(matches!(body, ResponseBody::Raw(_)));
    }

    #[test]
    fn plain_text_ok_is_success() {
        let envelope = Envelope::from_body(ResponseBody::Raw(json!("hello")), 200);
        assert!(envelope.is_success());
        assert_eq!(envelope.data(), Some(&json!("hello")));
        assert!(envelope.error().is_none());
        assert_eq!(envelope.status(), Some(200));
    }

    #[test]
    fn raw_error_uses_body_text_or_generic_message() {
        let with_text = Envelope::from_body(ResponseBody::Raw(json!("Bad gateway")), 502);
        assert_eq!(with_text.error(), Some("Bad gateway"));
        assert!(with_text.data().is_none());

        let empty = Envelope::from_body(ResponseBody::Raw(json!("")), 503);
        assert_eq!(empty.error(), Some("server error (status 503)"));

        let null = Envelope::from_body(ResponseBody::Raw(Value::Null), 500);
        assert_eq!(null.error(), Some("server error (status 500)"));
    }

    #[test]
    fn serializes_with_optional_fields_omitted() {
        let value = serde_json::to_value(Envelope::ok(json!("x"), 200)).unwrap();
        assert_eq!(
            value,
            json!({"data": "x", "error": null, "status": 200, "success": true})
        );
    }

    #[test]
    fn data_as_deserializes_payload() {
        #[derive(Deserialize)]
        struct Item {
            id: u32,
        }
        let envelope = Envelope::ok(json!({"id": 3}), 200);
        let item: Item = envelope.data_as().unwrap().unwrap();
        assert_eq!(item.id, 3);
    }
}
