//! Session relay (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                 SESSION RELAY                  │
//!   Browser              │  ┌─────────┐   ┌──────────────┐               │
//!   ─────────────────────┼─▶│  http   │──▶│    relay     │──────────────┼──▶ BPM upstream
//!   x-client-id          │  │ server  │   │   handler    │  token +     │
//!                        │  └─────────┘   └──────┬───────┘  session     │
//!                        │                       │          cookie      │
//!                        │                       ▼                      │
//!                        │                ┌──────────────┐              │
//!                        │                │ session store│              │
//!                        │                │ (id → creds) │              │
//!                        │                └──────────────┘              │
//!                        │  config · observability · lifecycle · tls    │
//!                        └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use session_relay::config::{load_config, load_default};
use session_relay::lifecycle::{signals, Shutdown};
use session_relay::net::tls::load_tls_config;
use session_relay::observability::{logging, metrics};
use session_relay::RelayServer;

#[derive(Parser)]
#[command(name = "session-relay")]
#[command(about = "Same-origin relay holding BPM sessions behind opaque client ids", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_default()?,
    };

    logging::init_tracing(&config.observability);
    tracing::info!("session-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        prefix = %config.upstream.path_prefix,
        session_ttl_secs = config.sessions.ttl_secs,
        max_sessions = config.sessions.max_entries,
        expose_upstream_credentials = config.security.expose_upstream_credentials,
        "Configuration loaded"
    );
    if config.security.expose_upstream_credentials {
        tracing::warn!("Upstream credentials will be exposed to browser scripts on relayed responses");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = RelayServer::new(config);

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address.parse()?;
            let rustls = load_tls_config(tls.cert_path.as_ref(), tls.key_path.as_ref()).await?;
            server.run_tls(addr, rustls, shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
