//! Same-origin relay to the upstream BPM service.
//!
//! # Data Flow
//! ```text
//! handler.rs     request/response plumbing, login and logout handling
//!     ├── credentials.rs  Set-Cookie parsing, header filtering
//!     ├── body.rs         content-type driven body re-encoding
//!     └── session.rs      client id → upstream credentials
//! ```
//!
//! # Design Decisions
//! - The browser only ever holds an opaque client id
//! - Upstream error statuses are relayed verbatim; only relay-side failures
//!   become a 500 proxy error

pub mod body;
pub mod credentials;
pub mod handler;
pub mod session;

pub use handler::{health_handler, relay_handler, RelayState, UpstreamClient};
pub use session::{SessionStore, UpstreamCredentials};
