//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce the upstream deadline)
//!     → On expiry: RelayError::Timeout → 500 proxy error
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline
//! - The relay never retries; retry policy belongs to the client SDK

pub mod timeouts;
