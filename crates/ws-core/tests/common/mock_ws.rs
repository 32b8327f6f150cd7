//! Mock WebSocket server for integration tests (adapted from the teacher's
//! `MockWsServer`, generalized from a fixed subscribe-echo responder to a
//! pluggable per-message handler so different scenarios — RPC echo,
//! correlation timeout via silence, forced disconnect — share one server).

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Given a parsed inbound JSON value, returns zero or more JSON values to
/// send back immediately. Returning nothing means "stay silent" (used by
/// the correlation-timeout scenario).
pub type Responder = Arc<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    messages: Arc<Mutex<VecDeque<String>>>,
    connection_count: Arc<AtomicU32>,
}

fn echo_subscribe_confirmation(value: &Value) -> Vec<Value> {
    if value.get("method").and_then(Value::as_str) == Some("public/subscribe") {
        let channels = value
            .get("params")
            .and_then(|p| p.get("channels"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        return channels
            .into_iter()
            .map(|channel| {
                serde_json::json!({
                    "method": "subscription",
                    "params": { "channel": channel },
                })
            })
            .collect();
    }
    if let Some(id) = value.get("id") {
        return vec![serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": { "ok": true } })];
    }
    Vec::new()
}

impl MockWsServer {
    pub async fn start() -> Self {
        Self::start_with_responder(Arc::new(echo_subscribe_confirmation)).await
    }

    pub async fn start_with_responder(responder: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let messages: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
        let connection_count = Arc::new(AtomicU32::new(0));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let messages_clone = messages.clone();
        let count_clone = connection_count.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        count_clone.fetch_add(1, Ordering::SeqCst);
                        tokio::spawn(handle_connection(stream, messages_clone.clone(), responder.clone()));
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            messages,
            connection_count,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn connection_count(&self) -> u32 {
        self.connection_count.load(Ordering::SeqCst)
    }

    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.iter().cloned().collect()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(stream: TcpStream, messages: Arc<Mutex<VecDeque<String>>>, responder: Responder) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(_) => return,
    };
    let (mut write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let text = text.to_string();
                messages.lock().await.push_back(text.clone());
                if let Ok(value) = serde_json::from_str::<Value>(&text) {
                    for reply in responder(&value) {
                        if write.send(Message::Text(reply.to_string())).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                if write.send(Message::Pong(data)).await.is_err() {
                    return;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }
}
