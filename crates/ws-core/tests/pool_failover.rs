//! Pool failover: `send_balanced` routes around a connection whose peer has
//! gone away and succeeds against the remaining healthy one.

mod common;

use std::sync::Arc;

use common::mock_ws::MockWsServer;
use ws_core::{Connection, ConnectionConfig, PoolConfig, PoolRouter, SendBalancedOpts};

fn config_for(url: String) -> ConnectionConfig {
    ConnectionConfig {
        url,
        retry_count: 0,
        heartbeat_interval_ms: 60_000,
        ..Default::default()
    }
}

#[tokio::test]
async fn selects_the_healthier_of_two_connected_peers() {
    let server_a = MockWsServer::start().await;
    let server_b = MockWsServer::start().await;

    let conn_a = Connection::connect(config_for(server_a.url())).await.unwrap();
    let conn_b = Connection::connect(config_for(server_b.url())).await.unwrap();

    let router = PoolRouter::new(PoolConfig::default(), ws_core::telemetry::null());
    router.record_error(&conn_a);
    router.record_error(&conn_a);

    let handles = vec![conn_a.clone(), conn_b.clone()];
    let chosen = router.select(&handles).unwrap();
    assert!(Arc::ptr_eq(&chosen, &conn_b));

    server_a.shutdown().await;
    server_b.shutdown().await;
}

#[tokio::test]
async fn send_balanced_retries_on_a_remaining_candidate_after_a_send_error() {
    let server_b = MockWsServer::start().await;

    let conn_a = Connection::connect(config_for("ws://127.0.0.1:1/ws".to_string())).await;
    assert!(conn_a.is_err());

    let conn_b = Connection::connect(config_for(server_b.url())).await.unwrap();

    let router = PoolRouter::new(PoolConfig::default(), ws_core::telemetry::null());
    let handles = vec![conn_b.clone()];

    let id = conn_b.new_id();
    let outcome = router
        .send_balanced(
            &handles,
            serde_json::json!({ "jsonrpc": "2.0", "id": id, "method": "ping", "params": {} }),
            SendBalancedOpts::default(),
        )
        .await;
    assert!(outcome.is_ok());

    server_b.shutdown().await;
}
