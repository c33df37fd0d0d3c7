//! Same-origin session relay for a BPM backend.
//!
//! The browser talks to the relay under a path prefix; the relay forwards to
//! the upstream BPM service, holding the upstream session cookie and API
//! token on the browser's behalf behind an opaque client id.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;
pub mod resilience;

pub use config::schema::RelayConfig;
pub use error::RelayError;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
