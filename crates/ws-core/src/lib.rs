//! Resilient WebSocket client core for long-lived market-data sessions.
//!
//! Provides:
//! - Connection lifecycle management with exponential-backoff reconnection
//! - Heartbeat monitoring with RTT accounting
//! - JSON-RPC request/response correlation with per-request timeouts
//! - Subscription tracking with automatic restoration after reconnect
//! - Token-bucket rate limiting with tiered backpressure
//! - A health-scored pool router for load balancing across connections

pub mod backoff;
pub mod config;
pub mod connection;
pub mod correlator;
pub mod error;
pub mod explain;
pub mod heartbeat;
pub mod latency;
pub mod message;
pub mod pool;
pub mod rate_limiter;
pub mod recorder;
pub mod send_handle;
pub mod subscription;
pub mod telemetry;

pub use config::{ConnectionConfig, HeartbeatMode, PoolConfig};
pub use connection::{Connection, ConnectionBuilder, ConnectionStatus, OnDisconnect, OnMessage, SendOutcome, StateMetrics};
pub use error::{WsError, WsResult};
pub use explain::{explain, ErrorExplanation};
pub use heartbeat::{HeartbeatAction, HeartbeatHealth};
pub use latency::{LatencyBuffer, LatencySummary};
pub use message::{InboundFrame, RequestId, Routed};
pub use pool::{PoolHealthEntry, PoolRouter, SendBalancedOpts};
pub use rate_limiter::{ConsumeOutcome, PressureLevel, RateLimiterConfig, RateLimiterHandle, RateLimiterStatus};
pub use recorder::{Direction as RecordDirection, FrameKind, RecordEntry, RecorderHandle, RecordingMetadata, SessionRecorder};
pub use send_handle::{SendError, SendHandle};
pub use subscription::SubscriptionRegistry;
pub use telemetry::{NullTelemetry, Telemetry};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Installs the rustls `ring` crypto provider. Call once before opening any
/// `wss://` connection; idempotent and cheap to call from every entry point.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
