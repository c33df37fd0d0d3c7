//! Network layer subsystem.
//!
//! Plain TCP listeners are bound by the binary; this module only covers the
//! optional TLS termination handed to `axum-server`.

pub mod tls;
