//! Prometheus metrics for `ws-core`.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration
//! fails (e.g. a duplicate metric name), that's a fatal startup
//! misconfiguration and should crash immediately rather than run
//! unobserved. These panics only occur during static initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram, register_histogram_vec,
    CounterVec, Gauge, GaugeVec, Histogram, HistogramVec,
};

use ws_core::Telemetry;

const PRESSURE_LEVELS: [&str; 4] = ["none", "low", "medium", "high"];

pub static WS_CONNECTION_UPGRADE_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "ws_connection_upgrade_ms",
        "WebSocket handshake time in milliseconds",
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap()
});

pub static WS_HEARTBEAT_RTT_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "ws_heartbeat_rtt_ms",
        "Heartbeat round-trip time in milliseconds",
        &["mode"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0]
    )
    .unwrap()
});

pub static WS_REQUEST_CORRELATOR_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ws_request_correlator_total",
        "Request correlator events by outcome",
        &["outcome"]
    )
    .unwrap()
});

pub static WS_REQUEST_ROUND_TRIP_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "ws_request_round_trip_ms",
        "Correlated request round-trip time in milliseconds",
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

pub static WS_SUBSCRIPTION_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("ws_subscription_total", "Subscription registry events", &["action"]).unwrap()
});

pub static WS_RATE_LIMITER_TOKENS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!("ws_rate_limiter_tokens", "Rate limiter tokens available", &["name"]).unwrap()
});

pub static WS_RATE_LIMITER_QUEUE_SIZE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!("ws_rate_limiter_queue_size", "Rate limiter queue depth", &["name"]).unwrap()
});

pub static WS_RATE_LIMITER_PRESSURE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "ws_rate_limiter_pressure",
        "Rate limiter pressure level (1=active, 0=inactive)",
        &["name", "level"]
    )
    .unwrap()
});

pub static WS_POOL_ROUTE_HEALTH: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!("ws_pool_route_health", "Health score of the most recently routed connection", &["selected"])
        .unwrap()
});

pub static WS_POOL_AVG_HEALTH: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("ws_pool_avg_health", "Average health score across the pool").unwrap());

/// Production [`ws_core::Telemetry`] implementation: a unit struct whose
/// trait methods record into the statics above.
pub struct Metrics;

impl Telemetry for Metrics {
    fn connection_upgrade(&self, _url: &str, connect_time_ms: u64) {
        WS_CONNECTION_UPGRADE_MS.observe(connect_time_ms as f64);
    }

    fn heartbeat_pong(&self, mode: &str, rtt_ms: u64) {
        WS_HEARTBEAT_RTT_MS.with_label_values(&[mode]).observe(rtt_ms as f64);
    }

    fn correlator_track(&self, _id: &str, _timeout_ms: u64) {
        WS_REQUEST_CORRELATOR_TOTAL.with_label_values(&["tracked"]).inc();
    }

    fn correlator_resolve(&self, _id: &str, round_trip_ms: u64) {
        WS_REQUEST_CORRELATOR_TOTAL.with_label_values(&["resolved"]).inc();
        WS_REQUEST_ROUND_TRIP_MS.observe(round_trip_ms as f64);
    }

    fn correlator_timeout(&self, _id: &str) {
        WS_REQUEST_CORRELATOR_TOTAL.with_label_values(&["timeout"]).inc();
    }

    fn subscription_add(&self, _channel: &str) {
        WS_SUBSCRIPTION_TOTAL.with_label_values(&["add"]).inc();
    }

    fn subscription_remove(&self, _channel: &str) {
        WS_SUBSCRIPTION_TOTAL.with_label_values(&["remove"]).inc();
    }

    fn subscription_restore(&self, channel_count: usize) {
        WS_SUBSCRIPTION_TOTAL.with_label_values(&["restore"]).inc_by(channel_count as f64);
    }

    fn rate_limiter_tokens(&self, name: &str, tokens: u64) {
        WS_RATE_LIMITER_TOKENS.with_label_values(&[name]).set(tokens as f64);
    }

    fn rate_limiter_queue_size(&self, name: &str, queue_size: usize) {
        WS_RATE_LIMITER_QUEUE_SIZE.with_label_values(&[name]).set(queue_size as f64);
    }

    fn rate_limiter_pressure(&self, name: &str, level: &str, _previous_level: &str) {
        for candidate in PRESSURE_LEVELS {
            WS_RATE_LIMITER_PRESSURE.with_label_values(&[name, candidate]).set(0.0);
        }
        WS_RATE_LIMITER_PRESSURE.with_label_values(&[name, level]).set(1.0);
    }

    fn pool_route(&self, selected: &str, health: u8, _pool_size: usize) {
        WS_POOL_ROUTE_HEALTH.with_label_values(&[selected]).set(health as f64);
    }

    fn pool_health(&self, _pool_size: usize, avg_health: f64) {
        WS_POOL_AVG_HEALTH.set(avg_health);
    }
}
