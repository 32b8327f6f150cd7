//! Connection Supervisor (§4.1, §5): owns the transport and runs the single
//! cooperative event loop that sequences every state transition. This is
//! the only component in the crate that touches the WebSocket handle
//! directly; everything else either feeds into this loop or reads a
//! snapshot the loop publishes.
//!
//! Generalized from the teacher's `ConnectionManager` (`hip3-ws::connection`):
//! same `connect_async` / split-sink-stream / `tokio::select!` shape, but the
//! mailbox now carries correlated JSON-RPC requests instead of a fixed set
//! of market-data subscriptions, and per-request timeouts are driven by a
//! `DelayQueue` rather than a single heartbeat timer.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tokio_util::time::DelayQueue;
use tracing::{error, info, warn};

use crate::backoff::{backoff, max_retries_exceeded, should_reconnect};
use crate::config::{ConnectionConfig, HeartbeatMode};
use crate::correlator::RequestCorrelator;
use crate::error::{WsError, WsResult};
use crate::heartbeat::{HeartbeatAction, HeartbeatHealth, HeartbeatManager};
use crate::latency::{LatencyBuffer, LatencySummary};
use crate::message::{self, RequestId, Routed, RESTORE_METHOD};
use crate::rate_limiter::{ConsumeOutcome, PressureLevel, RateLimiterHandle};
use crate::recorder::{Direction as RecDirection, FrameKind, RecorderHandle};
use crate::send_handle::SendHandle;
use crate::subscription::SubscriptionRegistry;
use crate::telemetry::{self, Telemetry};

type Transport = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsWrite = futures_util::stream::SplitSink<Transport, Message>;
type WsRead = futures_util::stream::SplitStream<Transport>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// The message carried no `id`; the loop wrote it and nothing more is
    /// tracked.
    Ack,
    /// The message was correlated by `id` and the matching response (or
    /// timeout, surfaced as an `Err` at the `send` call site) arrived.
    Response { value: Value, rtt_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct StateMetrics {
    pub status: ConnectionStatus,
    pub reconnect_attempt: u32,
    pub pending_requests: usize,
    pub subscription_count: usize,
    pub rate_limiter_pressure: Option<PressureLevel>,
}

/// Invoked off the event loop's own await points (spawned) so a slow or
/// panicking callback can never stall reconnection; fired exactly once per
/// disconnect event, including a final `Closed` on explicit shutdown.
pub type OnDisconnect = Arc<dyn Fn(WsError) + Send + Sync>;
/// Invoked for every inbound frame the loop doesn't route internally
/// (§4.1: heartbeat replies, subscription confirmations, and correlated
/// responses are consumed by the core; everything else reaches here).
pub type OnMessage = Arc<dyn Fn(Value) + Send + Sync>;

enum LoopCommand {
    Request {
        text: String,
        id: Option<RequestId>,
        resp: oneshot::Sender<WsResult<SendOutcome>>,
    },
    Close,
}

struct LoopContext {
    config: ConnectionConfig,
    status: Arc<RwLock<ConnectionStatus>>,
    subscriptions: Arc<SubscriptionRegistry>,
    correlator: Arc<RequestCorrelator>,
    heartbeat: Arc<HeartbeatManager>,
    latency: Arc<Mutex<LatencyBuffer>>,
    reconnect_attempt: Arc<AtomicU32>,
    recorder: Option<RecorderHandle>,
    telemetry: Arc<dyn Telemetry>,
    on_disconnect: Option<OnDisconnect>,
    on_message: Option<OnMessage>,
}

enum LoopExit {
    Closed,
    Error(WsError),
}

pub struct ConnectionBuilder {
    config: ConnectionConfig,
    telemetry: Arc<dyn Telemetry>,
    rate_limiter: Option<RateLimiterHandle>,
    recorder: Option<RecorderHandle>,
    on_disconnect: Option<OnDisconnect>,
    on_message: Option<OnMessage>,
}

impl ConnectionBuilder {
    fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            telemetry: telemetry::null(),
            rate_limiter: None,
            recorder: None,
            on_disconnect: None,
            on_message: None,
        }
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn rate_limiter(mut self, handle: RateLimiterHandle) -> Self {
        self.rate_limiter = Some(handle);
        self
    }

    pub fn recorder(mut self, handle: RecorderHandle) -> Self {
        self.recorder = Some(handle);
        self
    }

    pub fn on_disconnect(mut self, callback: OnDisconnect) -> Self {
        self.on_disconnect = Some(callback);
        self
    }

    pub fn on_message(mut self, callback: OnMessage) -> Self {
        self.on_message = Some(callback);
        self
    }

    /// Resolves once for the initial handshake (success, or exhaustion of
    /// `retry_count` attempts); the background task then continues to
    /// reconnect transparently without a second caller-visible resolution.
    pub async fn connect(self) -> WsResult<Arc<Connection>> {
        Connection::connect_inner(
            self.config,
            self.telemetry,
            self.rate_limiter,
            self.recorder,
            self.on_disconnect,
            self.on_message,
        )
        .await
    }
}

pub struct Connection {
    rate_limiter: Option<RateLimiterHandle>,
    status: Arc<RwLock<ConnectionStatus>>,
    subscriptions: Arc<SubscriptionRegistry>,
    correlator: Arc<RequestCorrelator>,
    heartbeat: Arc<HeartbeatManager>,
    latency: Arc<Mutex<LatencyBuffer>>,
    next_id: AtomicI64,
    reconnect_attempt: Arc<AtomicU32>,
    cmd_tx: mpsc::UnboundedSender<LoopCommand>,
    raw_tx: mpsc::UnboundedSender<String>,
    _loop_task: JoinHandle<()>,
}

impl Connection {
    pub fn builder(config: ConnectionConfig) -> ConnectionBuilder {
        ConnectionBuilder::new(config)
    }

    pub async fn connect(config: ConnectionConfig) -> WsResult<Arc<Connection>> {
        Self::builder(config).connect().await
    }

    async fn connect_inner(
        config: ConnectionConfig,
        telemetry: Arc<dyn Telemetry>,
        rate_limiter: Option<RateLimiterHandle>,
        recorder: Option<RecorderHandle>,
        on_disconnect: Option<OnDisconnect>,
        on_message: Option<OnMessage>,
    ) -> WsResult<Arc<Connection>> {
        config.validate()?;

        let status = Arc::new(RwLock::new(ConnectionStatus::Disconnected));
        let subscriptions = Arc::new(SubscriptionRegistry::new(config.restore_subscriptions));
        let correlator = Arc::new(RequestCorrelator::new(telemetry.clone()));
        let heartbeat = Arc::new(HeartbeatManager::new(
            config.heartbeat_mode,
            config.heartbeat_interval_ms,
            telemetry.clone(),
        ));
        let latency = Arc::new(Mutex::new(LatencyBuffer::new(config.latency_buffer_size)));
        let reconnect_attempt = Arc::new(AtomicU32::new(0));

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let ctx = LoopContext {
            config,
            status: status.clone(),
            subscriptions: subscriptions.clone(),
            correlator: correlator.clone(),
            heartbeat: heartbeat.clone(),
            latency: latency.clone(),
            reconnect_attempt: reconnect_attempt.clone(),
            recorder,
            telemetry,
            on_disconnect,
            on_message,
        };

        let loop_task = tokio::spawn(run(ctx, cmd_rx, raw_rx, ready_tx));

        let conn = Arc::new(Connection {
            rate_limiter,
            status,
            subscriptions,
            correlator,
            heartbeat,
            latency,
            next_id: AtomicI64::new(1),
            reconnect_attempt,
            cmd_tx,
            raw_tx,
            _loop_task: loop_task,
        });

        match ready_rx.await {
            Ok(Ok(())) => Ok(conn),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(WsError::Closed),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.read()
    }

    pub fn latency(&self) -> Option<LatencySummary> {
        self.latency.lock().summary()
    }

    pub fn heartbeat_health(&self) -> HeartbeatHealth {
        self.heartbeat.health()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.list()
    }

    pub fn state_metrics(&self) -> StateMetrics {
        StateMetrics {
            status: self.status(),
            reconnect_attempt: self.reconnect_attempt.load(Ordering::Relaxed),
            pending_requests: self.correlator.pending_count(),
            subscription_count: self.subscriptions.list().len(),
            rate_limiter_pressure: self.rate_limiter.as_ref().map(|rl| rl.status().pressure_level),
        }
    }

    /// A cloneable, fire-and-forget handle usable from any task without the
    /// request/response correlation `send` performs.
    pub fn send_handle(&self) -> SendHandle {
        SendHandle::new(self.raw_tx.clone(), self.rate_limiter.clone(), self.status.clone())
    }

    fn next_request_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Mints a request id in the same form the caller's protocol already
    /// uses; callers may ignore this and supply their own `id` field.
    pub fn new_id(&self) -> i64 {
        self.next_request_id()
    }

    /// Sends `message` and, if it carries a non-null `id`, waits for the
    /// matching response or the configured request timeout. A message with
    /// no `id` resolves as `Ack` once the loop has written it to the
    /// socket.
    pub async fn send(&self, message: Value) -> WsResult<SendOutcome> {
        if self.status() != ConnectionStatus::Connected {
            return Err(WsError::NotConnected);
        }
        let text = serde_json::to_string(&message)?;
        if let Some(limiter) = &self.rate_limiter {
            let tag = message.get("method").and_then(Value::as_str).unwrap_or("unknown");
            match limiter.consume(tag) {
                ConsumeOutcome::Ok => {}
                ConsumeOutcome::RateLimited => return Err(WsError::RateLimited),
                ConsumeOutcome::QueueFull => return Err(WsError::QueueFull),
            }
        }
        let id = message::extract_id(&text);
        let (resp_tx, resp_rx) = oneshot::channel();
        self.cmd_tx
            .send(LoopCommand::Request { text, id, resp: resp_tx })
            .map_err(|_| WsError::Closed)?;
        resp_rx.await.map_err(|_| WsError::Closed)?
    }

    /// Sends a single-channel subscribe request (§4.4). The channel joins
    /// the restore set only once the server sends back a subscription
    /// confirmation; a bare send does not assume success.
    pub async fn subscribe(&self, channel: impl Into<String>) -> WsResult<SendOutcome> {
        let channel = channel.into();
        let request = serde_json::json!({
            "method": RESTORE_METHOD,
            "params": { "channels": [channel] },
        });
        self.send(request).await
    }

    /// Drops `channel` from the restore set. The registry documents removal
    /// as an explicit user action only — the core never prunes this set on
    /// disconnect.
    pub fn forget_subscription(&self, channel: &str) -> bool {
        self.subscriptions.remove(channel)
    }

    pub fn close(&self) -> WsResult<()> {
        self.cmd_tx.send(LoopCommand::Close).map_err(|_| WsError::Closed)
    }
}

fn build_request(
    config: &ConnectionConfig,
) -> WsResult<tokio_tungstenite::tungstenite::handshake::client::Request> {
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};

    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| WsError::InvalidConfig(e.to_string()))?;
    for (key, value) in &config.headers {
        let name = HeaderName::try_from(key.as_str()).map_err(|e| WsError::InvalidConfig(e.to_string()))?;
        let val = HeaderValue::try_from(value.as_str()).map_err(|e| WsError::InvalidConfig(e.to_string()))?;
        request.headers_mut().insert(name, val);
    }
    Ok(request)
}

/// `wss` connections are requested with TLS and an ALPN list advertising
/// only `http/1.1` (§4.5, §6): some reverse proxies otherwise negotiate
/// HTTP/2 and drop the Upgrade header. `ws` connections need no connector.
fn build_connector(config: &ConnectionConfig) -> WsResult<Option<Connector>> {
    if !config.is_wss() {
        return Ok(None);
    }
    let certs = rustls_native_certs::load_native_certs()
        .map_err(|e| WsError::TlsHandshakeFailed(e.to_string()))?;
    let mut root_store = rustls::RootCertStore::empty();
    for cert in certs {
        root_store
            .add(cert)
            .map_err(|e| WsError::TlsHandshakeFailed(e.to_string()))?;
    }
    let mut tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    tls_config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(Some(Connector::Rustls(Arc::new(tls_config))))
}

/// The outer reconnect loop (§4.5): connect, run the connected event loop
/// to exhaustion, then decide whether to retry with backoff or give up.
async fn run(
    ctx: LoopContext,
    mut cmd_rx: mpsc::UnboundedReceiver<LoopCommand>,
    mut raw_rx: mpsc::UnboundedReceiver<String>,
    ready_tx: oneshot::Sender<WsResult<()>>,
) {
    let mut ready_tx = Some(ready_tx);
    let mut attempt: u32 = 0;

    enum Step {
        Retry,
        Stop,
    }

    loop {
        *ctx.status.write() = ConnectionStatus::Connecting;

        let request = match build_request(&ctx.config) {
            Ok(r) => r,
            Err(e) => {
                if let Some(tx) = ready_tx.take() {
                    let _ = tx.send(Err(e));
                }
                return;
            }
        };
        let connector = match build_connector(&ctx.config) {
            Ok(c) => c,
            Err(e) => {
                if let Some(tx) = ready_tx.take() {
                    let _ = tx.send(Err(e));
                }
                return;
            }
        };

        let connect_started = Instant::now();
        let step = match connect_async_tls_with_config(request, None, false, connector).await {
            Ok((stream, _response)) => {
                let connect_time_ms = connect_started.elapsed().as_millis() as u64;
                ctx.telemetry.connection_upgrade(&ctx.config.url, connect_time_ms);
                *ctx.status.write() = ConnectionStatus::Connected;
                attempt = 0;
                ctx.reconnect_attempt.store(0, Ordering::Relaxed);
                info!(url = %ctx.config.url, connect_time_ms, "connection established");

                if let Some(tx) = ready_tx.take() {
                    let _ = tx.send(Ok(()));
                }

                ctx.heartbeat.start_timer();
                let (mut write, mut read) = stream.split();

                if let Some(restore) = ctx.subscriptions.build_restore_message() {
                    let channel_count = ctx.subscriptions.list().len();
                    match write.send(Message::Text(restore.clone())).await {
                        Ok(()) => {
                            record_out(&ctx, &restore);
                            ctx.telemetry.subscription_restore(channel_count);
                        }
                        Err(err) => warn!(?err, "failed to send subscription restore"),
                    }
                }

                let exit = run_connected(&ctx, &mut write, &mut read, &mut cmd_rx, &mut raw_rx).await;
                ctx.heartbeat.cancel_timer();
                *ctx.status.write() = ConnectionStatus::Disconnected;
                let _ = write.close().await;

                match exit {
                    LoopExit::Closed => {
                        ctx.correlator.teardown(WsError::Closed);
                        invoke_disconnect(&ctx, WsError::Closed);
                        Step::Stop
                    }
                    LoopExit::Error(err) => {
                        ctx.correlator.teardown(err.clone());
                        invoke_disconnect(&ctx, err.clone());
                        if ctx.config.reconnect_on_error && should_reconnect(&err) {
                            Step::Retry
                        } else {
                            Step::Stop
                        }
                    }
                }
            }
            Err(err) => {
                let err: WsError = err.into();
                *ctx.status.write() = ConnectionStatus::Disconnected;
                warn!(?err, attempt, "connection attempt failed");
                Step::Retry
            }
        };

        if matches!(step, Step::Stop) {
            return;
        }

        attempt += 1;
        ctx.reconnect_attempt.store(attempt, Ordering::Relaxed);

        if max_retries_exceeded(attempt, ctx.config.retry_count) {
            error!(attempt, "max reconnection attempts reached");
            if let Some(tx) = ready_tx.take() {
                let _ = tx.send(Err(WsError::MaxReconnectionAttempts));
            }
            return;
        }

        let delay = backoff(attempt - 1, ctx.config.retry_delay_ms, ctx.config.max_backoff_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

/// The inner event loop (§5): a single `tokio::select!` over the command
/// mailbox, the fire-and-forget raw-send channel, the transport's read
/// stream, the per-request timeout queue, and the heartbeat tick. Total
/// order on every branch — no two state transitions interleave.
async fn run_connected(
    ctx: &LoopContext,
    write: &mut WsWrite,
    read: &mut WsRead,
    cmd_rx: &mut mpsc::UnboundedReceiver<LoopCommand>,
    raw_rx: &mut mpsc::UnboundedReceiver<String>,
) -> LoopExit {
    let heartbeat_enabled = ctx.heartbeat.mode() != HeartbeatMode::Disabled;
    let mut heartbeat_tick = tokio::time::interval(ctx.heartbeat.interval());
    heartbeat_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut timeouts: DelayQueue<RequestId> = DelayQueue::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(LoopCommand::Request { text, id, resp }) => {
                        match write.send(Message::Text(text.clone())).await {
                            Ok(()) => {
                                record_out(ctx, &text);
                                match id {
                                    Some(id) => {
                                        let (tx, rx) = oneshot::channel();
                                        ctx.correlator.track(id.clone(), tx, ctx.config.request_timeout_ms);
                                        timeouts.insert(id, Duration::from_millis(ctx.config.request_timeout_ms));
                                        let latency = ctx.latency.clone();
                                        tokio::spawn(async move {
                                            let outcome = match rx.await {
                                                Ok(Ok((value, rtt_ms))) => {
                                                    latency.lock().add(rtt_ms);
                                                    Ok(SendOutcome::Response { value, rtt_ms })
                                                }
                                                Ok(Err(e)) => Err(e),
                                                Err(_) => Err(WsError::Closed),
                                            };
                                            let _ = resp.send(outcome);
                                        });
                                    }
                                    None => {
                                        let _ = resp.send(Ok(SendOutcome::Ack));
                                    }
                                }
                            }
                            Err(err) => {
                                let ws_err: WsError = err.into();
                                let _ = resp.send(Err(ws_err.clone()));
                                return LoopExit::Error(ws_err);
                            }
                        }
                    }
                    Some(LoopCommand::Close) => return LoopExit::Closed,
                    None => return LoopExit::Closed,
                }
            }

            raw = raw_rx.recv() => {
                match raw {
                    Some(text) => {
                        if let Err(err) = write.send(Message::Text(text.clone())).await {
                            return LoopExit::Error(err.into());
                        }
                        record_out(ctx, &text);
                    }
                    None => return LoopExit::Closed,
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text = text.to_string();
                        ctx.heartbeat.record_message();
                        record_in(ctx, &text);
                        handle_inbound_text(ctx, &text);
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let bytes = bytes.to_vec();
                        ctx.heartbeat.record_message();
                        record_in_binary(ctx, &bytes);
                        if let Some(cb) = &ctx.on_message {
                            cb(serde_json::json!({ "binary_len": bytes.len() }));
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(err) = write.send(Message::Pong(data)).await {
                            return LoopExit::Error(err.into());
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        if let Some(rtt) = ctx.heartbeat.record_reply() {
                            ctx.latency.lock().add(rtt);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.to_string()))
                            .unwrap_or((1000, String::new()));
                        record_close(ctx, code, reason);
                        return LoopExit::Error(WsError::TransportDown);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return LoopExit::Error(err.into()),
                    None => return LoopExit::Error(WsError::TransportDown),
                }
            }

            maybe_expired = timeouts.next() => {
                if let Some(expired) = maybe_expired {
                    let id = expired.into_inner();
                    ctx.correlator.timeout(&id);
                }
            }

            _ = heartbeat_tick.tick(), if heartbeat_enabled => {
                match ctx.heartbeat.on_tick(None) {
                    Ok(HeartbeatAction::Ping) => {
                        if let Err(err) = write.send(Message::Ping(Vec::new().into())).await {
                            return LoopExit::Error(err.into());
                        }
                    }
                    Ok(HeartbeatAction::Send(body)) => {
                        let text = body.to_string();
                        if let Err(err) = write.send(Message::Text(text.clone())).await {
                            return LoopExit::Error(err.into());
                        }
                        record_out(ctx, &text);
                    }
                    Ok(HeartbeatAction::None) => {}
                    Err(()) => return LoopExit::Error(WsError::TransportDown),
                }
            }
        }
    }
}

fn handle_inbound_text(ctx: &LoopContext, text: &str) {
    match message::decode_text(text) {
        message::InboundFrame::Json(value) => match message::classify(value) {
            Routed::Heartbeat(value) => {
                if let Some(rtt) = ctx.heartbeat.record_reply() {
                    ctx.latency.lock().add(rtt);
                }
                if let Some(cb) = &ctx.on_message {
                    cb(value);
                }
            }
            Routed::SubscriptionConfirmation { channel, raw } => {
                if ctx.subscriptions.add(&channel) {
                    ctx.telemetry.subscription_add(&channel);
                }
                if let Some(cb) = &ctx.on_message {
                    cb(raw);
                }
            }
            Routed::Response { id, body } => {
                if ctx.correlator.resolve(&id, body.clone()).is_none() {
                    if let Some(cb) = &ctx.on_message {
                        cb(body);
                    }
                }
            }
            Routed::Other(value) => {
                if let Some(cb) = &ctx.on_message {
                    cb(value);
                }
            }
        },
        message::InboundFrame::Text(raw_text) => {
            if let Some(cb) = &ctx.on_message {
                cb(Value::String(raw_text));
            }
        }
        message::InboundFrame::Binary(_) => {}
    }
}

fn invoke_disconnect(ctx: &LoopContext, err: WsError) {
    if let Some(cb) = ctx.on_disconnect.clone() {
        tokio::spawn(async move {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(err))).is_err() {
                tracing::error!("on_disconnect callback panicked");
            }
        });
    }
}

fn record_out(ctx: &LoopContext, text: &str) {
    if let Some(recorder) = &ctx.recorder {
        recorder.record(RecDirection::Out, FrameKind::Text(text.to_string()), Utc::now());
    }
}

fn record_in(ctx: &LoopContext, text: &str) {
    if let Some(recorder) = &ctx.recorder {
        recorder.record(RecDirection::In, FrameKind::Text(text.to_string()), Utc::now());
    }
}

fn record_in_binary(ctx: &LoopContext, bytes: &[u8]) {
    if let Some(recorder) = &ctx.recorder {
        recorder.record(RecDirection::In, FrameKind::Binary(bytes.to_vec()), Utc::now());
    }
}

fn record_close(ctx: &LoopContext, code: u16, reason: String) {
    if let Some(recorder) = &ctx.recorder {
        recorder.record(RecDirection::In, FrameKind::Close { code, reason }, Utc::now());
    }
}
