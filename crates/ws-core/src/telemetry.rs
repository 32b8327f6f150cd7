//! Telemetry seam (SPEC_FULL §11 Open Question): `ws-core` stays free of a
//! hard `prometheus` dependency by routing every event in §6's table
//! through this trait object. `ws-telemetry::Metrics` is the production
//! implementation; tests use `NullTelemetry`.

use std::sync::Arc;

pub trait Telemetry: Send + Sync {
    fn connection_upgrade(&self, url: &str, connect_time_ms: u64) {
        let _ = (url, connect_time_ms);
    }
    fn heartbeat_pong(&self, mode: &str, rtt_ms: u64) {
        let _ = (mode, rtt_ms);
    }
    fn correlator_track(&self, id: &str, timeout_ms: u64) {
        let _ = (id, timeout_ms);
    }
    fn correlator_resolve(&self, id: &str, round_trip_ms: u64) {
        let _ = (id, round_trip_ms);
    }
    fn correlator_timeout(&self, id: &str) {
        let _ = id;
    }
    fn subscription_add(&self, channel: &str) {
        let _ = channel;
    }
    fn subscription_remove(&self, channel: &str) {
        let _ = channel;
    }
    fn subscription_restore(&self, channel_count: usize) {
        let _ = channel_count;
    }
    fn rate_limiter_tokens(&self, name: &str, tokens: u64) {
        let _ = (name, tokens);
    }
    fn rate_limiter_queue_size(&self, name: &str, queue_size: usize) {
        let _ = (name, queue_size);
    }
    fn rate_limiter_pressure(&self, name: &str, level: &str, previous_level: &str) {
        let _ = (name, level, previous_level);
    }
    fn pool_route(&self, selected: &str, health: u8, pool_size: usize) {
        let _ = (selected, health, pool_size);
    }
    fn pool_health(&self, pool_size: usize, avg_health: f64) {
        let _ = (pool_size, avg_health);
    }
}

/// Default no-op implementation for tests and callers that don't wire in
/// `ws-telemetry`.
pub struct NullTelemetry;
impl Telemetry for NullTelemetry {}

pub fn null() -> Arc<dyn Telemetry> {
    Arc::new(NullTelemetry)
}
