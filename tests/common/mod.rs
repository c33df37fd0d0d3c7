//! Mock BPM upstream for relay integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Form, RawQuery},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde_json::json;
use session_relay::RelayConfig;
use tokio::net::TcpListener;

pub const USERNAME: &str = "walter.bates";
pub const PASSWORD: &str = "bpm";
pub const SESSION_ID: &str = "0A1B2C3D4E5F";
pub const API_TOKEN: &str = "c4f0-token";

/// Start the mock upstream on an ephemeral port.
pub async fn start_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/bonita/loginservice", post(login))
        .route("/bonita/logoutservice", get(logout))
        .route("/bonita/API/bpm/process", get(processes))
        .route("/bonita/API/echo", any(echo))
        .route("/bonita/API/slow", get(slow));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Relay configuration pointing at `upstream`.
pub fn relay_config(upstream: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = format!("http://{upstream}/bonita");
    config
}

async fn login(Form(form): Form<HashMap<String, String>>) -> Response {
    let username = form.get("username").map(String::as_str);
    let password = form.get("password").map(String::as_str);

    match (username, password) {
        (Some(USERNAME), Some(PASSWORD)) => (
            StatusCode::NO_CONTENT,
            AppendHeaders([
                (header::SET_COOKIE, format!("JSESSIONID={SESSION_ID}; Path=/bonita; HttpOnly")),
                (header::SET_COOKIE, format!("X-Bonita-API-Token={API_TOKEN}; Path=/bonita")),
                (header::SET_COOKIE, "bonita.tenant=1; Path=/".to_string()),
            ]),
        )
            .into_response(),
        (Some("anonymous"), _) => StatusCode::NO_CONTENT.into_response(),
        _ => (StatusCode::UNAUTHORIZED, "Bad credentials").into_response(),
    }
}

async fn logout() -> StatusCode {
    StatusCode::OK
}

fn authorized(headers: &HeaderMap) -> bool {
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());
    let token = headers.get("X-Bonita-API-Token").and_then(|v| v.to_str().ok());
    cookie == Some(format!("JSESSIONID={SESSION_ID}").as_str()) && token == Some(API_TOKEN)
}

async fn processes(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "").into_response();
    }
    (
        StatusCode::OK,
        [
            (header::SET_COOKIE, format!("JSESSIONID={SESSION_ID}; Path=/bonita")),
            (header::HeaderName::from_static("x-bonita-api-token"), API_TOKEN.to_string()),
        ],
        Json(json!([{ "id": "6024195117474470000", "name": "Pool", "version": "1.0" }])),
    )
        .into_response()
}

async fn echo(headers: HeaderMap, RawQuery(query): RawQuery, body: Bytes) -> Json<serde_json::Value> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    Json(json!({
        "contentType": header("content-type"),
        "body": String::from_utf8_lossy(&body),
        "query": query,
        "clientId": header("x-client-id"),
        "requestId": header("x-request-id"),
        "cookies": headers
            .get_all("cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>(),
        "authorized": authorized(&headers),
    }))
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "late"
}
