//! Structured logging and Prometheus metrics for `ws-core`.
//!
//! Provides observability from day one:
//! - Prometheus metrics for connection lifecycle, heartbeat RTT, request
//!   correlation, subscriptions, rate limiting, and pool health
//! - Structured JSON logging with `tracing`

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
