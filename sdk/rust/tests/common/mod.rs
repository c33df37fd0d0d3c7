//! Mock backend for client integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Per-route hit counters.
#[derive(Clone, Default)]
pub struct Hits {
    pub server_error: Arc<AtomicU32>,
    pub malformed_server_error: Arc<AtomicU32>,
    pub not_found: Arc<AtomicU32>,
    pub slow: Arc<AtomicU32>,
}

impl Hits {
    pub fn get(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub hits: Hits,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start the mock backend on an ephemeral port.
pub async fn start_backend() -> MockBackend {
    let hits = Hits::default();
    let app = Router::new()
        .route("/whoami", get(whoami))
        .route("/unauthorized", get(unauthorized))
        .route("/echo", post(echo))
        .route("/echo-method", any(echo_method))
        .route("/always-500", get(always_500))
        .route("/malformed-500", get(malformed_500))
        .route("/not-found", get(not_found))
        .route("/text", get(|| async { "hello" }))
        .route("/login-failure", get(login_failure))
        .route("/slow", get(slow))
        .route("/malformed", get(malformed))
        .route("/empty-json", get(empty_json))
        .route("/upload", post(upload))
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, hits }
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn whoami(headers: HeaderMap) -> String {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("<none>")
        .to_string()
}

async fn unauthorized() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, "Token invalid")
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "success": true, "data": body }))
}

async fn echo_method(method: Method, body: Bytes) -> Json<Value> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    Json(json!({ "success": true, "data": { "method": method.as_str(), "body": body } }))
}

async fn always_500(State(hits): State<Hits>) -> impl IntoResponse {
    hits.server_error.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn not_found(State(hits): State<Hits>) -> impl IntoResponse {
    hits.not_found.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, "no such thing")
}

async fn login_failure() -> Json<Value> {
    Json(json!({
        "success": false,
        "message": "Invalid credentials",
        "code": "AUTH_001"
    }))
}

async fn slow(State(hits): State<Hits>) -> &'static str {
    hits.slow.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(2)).await;
    "finally"
}

async fn malformed() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        "<html>this is not json</html>",
    )
}

async fn malformed_500(State(hits): State<Hits>) -> impl IntoResponse {
    hits.malformed_server_error.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json")],
        "not json",
    )
}

async fn empty_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "")
}

async fn upload(mut multipart: Multipart) -> Json<Value> {
    let mut files = 0;
    let mut names = Vec::new();
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "files" {
            files += 1;
            names.push(field.file_name().unwrap_or_default().to_string());
            let _ = field.bytes().await.unwrap();
        } else {
            fields.insert(name, field.text().await.unwrap());
        }
    }
    Json(json!({ "success": true, "data": { "files": files, "names": names, "fields": fields } }))
}
