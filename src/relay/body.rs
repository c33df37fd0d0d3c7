//! Request body re-encoding by content type.
//!
//! JSON bodies are parsed and re-serialized, form-urlencoded bodies are
//! decoded and re-encoded, anything else is forwarded untouched.

use axum::body::Bytes;
use axum::http::Method;
use url::form_urlencoded;

use crate::error::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Opaque,
}

impl BodyKind {
    /// Classify from a `Content-Type` value; parameters are ignored.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let essence = content_type
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase());

        match essence.as_deref() {
            Some("application/json") => BodyKind::Json,
            Some(value) if value.ends_with("+json") => BodyKind::Json,
            Some("application/x-www-form-urlencoded") => BodyKind::Form,
            _ => BodyKind::Opaque,
        }
    }
}

/// Body to send upstream, or `None` when nothing should be sent.
pub fn encode_body(
    method: &Method,
    content_type: Option<&str>,
    body: Bytes,
) -> Result<Option<Bytes>, RelayError> {
    if *method == Method::GET || *method == Method::HEAD || body.is_empty() {
        return Ok(None);
    }

    match BodyKind::from_content_type(content_type) {
        BodyKind::Json => {
            let value: serde_json::Value =
                serde_json::from_slice(&body).map_err(|e| RelayError::InvalidBody {
                    content_type: "JSON",
                    reason: e.to_string(),
                })?;
            let encoded = serde_json::to_vec(&value).map_err(|e| RelayError::InvalidBody {
                content_type: "JSON",
                reason: e.to_string(),
            })?;
            Ok(Some(Bytes::from(encoded)))
        }
        BodyKind::Form => {
            let text = std::str::from_utf8(&body).map_err(|e| RelayError::InvalidBody {
                content_type: "form",
                reason: e.to_string(),
            })?;
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(form_urlencoded::parse(text.as_bytes()))
                .finish();
            Ok(Some(Bytes::from(encoded)))
        }
        BodyKind::Opaque => Ok(Some(body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_content_types() {
        assert_eq!(BodyKind::from_content_type(Some("application/json; charset=utf-8")), BodyKind::Json);
        assert_eq!(BodyKind::from_content_type(Some("application/problem+json")), BodyKind::Json);
        assert_eq!(
            BodyKind::from_content_type(Some("application/x-www-form-urlencoded")),
            BodyKind::Form
        );
        assert_eq!(BodyKind::from_content_type(Some("text/plain")), BodyKind::Opaque);
        assert_eq!(BodyKind::from_content_type(None), BodyKind::Opaque);
    }

    #[test]
    fn json_is_reserialized() {
        let body = Bytes::from_static(b"{ \"username\" :  \"walter.bates\" }");
        let encoded = encode_body(&Method::POST, Some("application/json"), body).unwrap().unwrap();
        assert_eq!(&encoded[..], br#"{"username":"walter.bates"}"#);
    }

    #[test]
    fn form_is_reencoded() {
        let body = Bytes::from_static(b"username=walter.bates&password=b%20pm&redirect=false");
        let encoded = encode_body(&Method::POST, Some("application/x-www-form-urlencoded"), body)
            .unwrap()
            .unwrap();
        assert_eq!(&encoded[..], b"username=walter.bates&password=b+pm&redirect=false");
    }

    #[test]
    fn opaque_passes_through() {
        let body = Bytes::from_static(b"\x00\x01binary");
        let encoded = encode_body(&Method::PUT, Some("application/octet-stream"), body.clone())
            .unwrap()
            .unwrap();
        assert_eq!(encoded, body);
    }

    #[test]
    fn get_and_empty_bodies_send_nothing() {
        assert!(encode_body(&Method::GET, None, Bytes::from_static(b"x")).unwrap().is_none());
        assert!(encode_body(&Method::POST, Some("application/json"), Bytes::new()).unwrap().is_none());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let result = encode_body(&Method::POST, Some("application/json"), Bytes::from_static(b"{"));
        assert!(matches!(result, Err(RelayError::InvalidBody { content_type: "JSON", .. })));
    }
}
