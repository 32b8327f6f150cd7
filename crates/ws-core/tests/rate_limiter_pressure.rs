//! Rate limiter pressure escalates under load driven through a live
//! `Connection::send`, not just the unit-level `RateLimiterState` API.

mod common;

use std::sync::Arc;

use common::mock_ws::MockWsServer;
use serde_json::Value;
use ws_core::{rate_limiter, Connection, ConnectionConfig, PressureLevel, RateLimiterConfig, WsError};

#[tokio::test]
async fn exhausting_tokens_rate_limits_sends_through_the_connection() {
    rate_limiter::shutdown("integration-test-limiter");
    let limiter = rate_limiter::init(
        "integration-test-limiter",
        RateLimiterConfig::uniform_cost(2, 0, 1_000_000, 1),
        ws_core::telemetry::null(),
    );

    let server = MockWsServer::start().await;
    let config = ConnectionConfig {
        url: server.url(),
        heartbeat_interval_ms: 60_000,
        ..Default::default()
    };
    let conn = Connection::builder(config).rate_limiter(limiter).connect().await.unwrap();

    // First two sends consume the bucket; each carries a distinct id so the
    // correlator doesn't collide on inserts.
    for _ in 0..2 {
        let id = conn.new_id();
        let _ = conn
            .send(serde_json::json!({ "jsonrpc": "2.0", "id": id, "method": "ping", "params": {} }))
            .await;
    }

    // The third send finds an empty bucket and a full single-slot queue.
    let id = conn.new_id();
    let result = conn
        .send(serde_json::json!({ "jsonrpc": "2.0", "id": id, "method": "ping", "params": {} }))
        .await;
    assert!(matches!(result, Err(WsError::RateLimited) | Err(WsError::QueueFull)));

    server.shutdown().await;
    rate_limiter::shutdown("integration-test-limiter");
}

#[tokio::test]
async fn pressure_is_visible_via_state_metrics() {
    rate_limiter::shutdown("integration-test-pressure");
    let cost_fn: rate_limiter::CostFn = Arc::new(|_| 10);
    let limiter = rate_limiter::init(
        "integration-test-pressure",
        RateLimiterConfig {
            capacity: 1,
            refill_amount: 0,
            refill_interval_ms: 1_000_000,
            max_queue_size: 10,
            cost_fn,
        },
        ws_core::telemetry::null(),
    );

    let server = MockWsServer::start().await;
    let config = ConnectionConfig {
        url: server.url(),
        heartbeat_interval_ms: 60_000,
        ..Default::default()
    };
    let conn = Connection::builder(config).rate_limiter(limiter).connect().await.unwrap();

    for _ in 0..5 {
        let id = conn.new_id();
        let _ = conn
            .send(serde_json::json!({ "jsonrpc": "2.0", "id": id, "method": "ping", "params": {} }))
            .await;
    }

    let pressure = conn.state_metrics().rate_limiter_pressure;
    assert!(matches!(pressure, Some(PressureLevel::Low) | Some(PressureLevel::Medium) | Some(PressureLevel::High)));

    server.shutdown().await;
    rate_limiter::shutdown("integration-test-pressure");
}
