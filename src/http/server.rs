//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay and health handlers
//! - Wire up middleware (CORS, tracing, request ID, timeout)
//! - Serve on a plain listener or behind TLS
//! - Run the session sweeper alongside the server
//! - Drain in-flight requests on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderValue, Method},
    routing::{any, get},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use hyper_util::{client::legacy::connect::HttpConnector, client::legacy::Client, rt::TokioExecutor};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{CorsConfig, RelayConfig};
use crate::http::request::X_REQUEST_ID;
use crate::http::response::not_found;
use crate::lifecycle::shutdown::{wait_for_shutdown, Shutdown};
use crate::relay::{health_handler, relay_handler, RelayState, SessionStore};

/// Time allowed for in-flight TLS connections to finish after shutdown.
const TLS_DRAIN_SECS: u64 = 10;

/// HTTP server for the session relay.
pub struct RelayServer {
    router: Router,
    config: Arc<RelayConfig>,
    sessions: SessionStore,
}

impl RelayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: RelayConfig) -> Self {
        let config = Arc::new(config);
        let sessions = SessionStore::from_config(&config.sessions);

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.upstream_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = RelayState {
            config: config.clone(),
            sessions: sessions.clone(),
            client,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            sessions,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: RelayState) -> Router {
        let prefix = config.upstream.path_prefix.trim_end_matches('/');

        Router::new()
            .route("/health", get(health_handler))
            .route(prefix, any(relay_handler))
            .route(&format!("{prefix}/"), any(relay_handler))
            .route(&format!("{prefix}/{{*path}}"), any(relay_handler))
            .fallback(not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(cors_layer(&config.cors))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn spawn_sweeper(&self, shutdown: &Shutdown) {
        let interval = Duration::from_secs(self.config.sessions.sweep_interval_secs);
        tokio::spawn(self.sessions.clone().run_sweeper(interval, shutdown.subscribe()));
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            prefix = %self.config.upstream.path_prefix,
            "HTTP server starting"
        );

        self.spawn_sweeper(&shutdown);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown.subscribe()))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server behind TLS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTPS server starting"
        );

        self.spawn_sweeper(&shutdown);

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            wait_for_shutdown(rx).await;
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Credentialed CORS for the configured browser origins.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(config.allow_credentials)
}
