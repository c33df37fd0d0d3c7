//! Request client for the portal backend and the BPM session relay.
//!
//! # Data Flow
//! ```text
//! caller
//!     → service.rs (auth injection, logout / error signals)
//!     → transport.rs (URL, headers, body, timeout, retry)
//!     → envelope.rs (standardized vs raw body → Envelope)
//!     → caller
//! ```
//!
//! # Design Decisions
//! - Every call resolves to an `Envelope`; ordinary failures are data, not `Err`
//! - Auth state is read through `AuthStore`, never written
//! - Cross-cutting reactions (logout, notifications) go out through `SignalBus`
//! - No global instances: the composition root builds and shares an `ApiClient`

pub mod auth;
pub mod backoff;
pub mod config;
pub mod envelope;
pub mod error;
pub mod request;
pub mod service;
pub mod signals;
pub mod transport;

pub use auth::{AuthState, AuthStore, FileAuthStore, MemoryAuthStore};
pub use config::ClientConfig;
pub use envelope::{BackendEnvelope, Envelope, ResponseBody};
pub use error::TransportError;
pub use request::{FilePart, MultipartPayload, QueryValue, RequestBody, RequestOptions};
pub use service::{ApiClient, PublicApi};
pub use signals::{BroadcastSignals, ClientSignal, NoopSignals, SignalBus};
pub use transport::HttpClient;
