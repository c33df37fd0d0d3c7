//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! relay handler, session store
//!     → logging.rs (structured log events, request id in every span)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
