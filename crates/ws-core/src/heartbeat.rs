//! Heartbeat Manager (§4.2): schedules periodic heartbeats, tracks
//! liveness, records RTT.
//!
//! Timer *ownership* stays with the Connection event loop (§9 design
//! notes): this module only records state and tells the caller what action
//! to take when the loop's tick fires. It never schedules anything itself.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::Value;

use crate::config::HeartbeatMode;
use crate::telemetry::Telemetry;

/// Failure-rule multiplier K (§4.2): a heartbeat fault fires only once the
/// silence exceeds `interval_ms * K`, not on every missed single tick.
const TIMEOUT_FACTOR: u32 = 2;

#[derive(Debug, Clone)]
pub enum HeartbeatAction {
    /// Emit a protocol-level ping (`ping_pong` mode).
    Ping,
    /// Emit this application-level JSON request (`application_request` mode).
    Send(Value),
    None,
}

#[derive(Debug, Clone)]
pub struct HeartbeatHealth {
    pub mode: HeartbeatMode,
    pub last_seen_ms_ago: Option<u64>,
    pub consecutive_failures: u32,
    pub timer_armed: bool,
}

struct State {
    last_sent_at: Option<Instant>,
    last_seen_at: Option<Instant>,
    consecutive_failures: u32,
    armed: bool,
}

pub struct HeartbeatManager {
    mode: HeartbeatMode,
    interval_ms: u64,
    state: RwLock<State>,
    telemetry: Arc<dyn Telemetry>,
}

impl HeartbeatManager {
    pub fn new(mode: HeartbeatMode, interval_ms: u64, telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            mode,
            interval_ms,
            state: RwLock::new(State {
                last_sent_at: None,
                last_seen_at: None,
                consecutive_failures: 0,
                armed: false,
            }),
            telemetry,
        }
    }

    pub fn mode(&self) -> HeartbeatMode {
        self.mode
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Armed on transition to `connected`.
    pub fn start_timer(&self) {
        if matches!(self.mode, HeartbeatMode::Disabled) {
            return;
        }
        let mut state = self.state.write();
        state.armed = true;
        state.last_seen_at = Some(Instant::now());
        state.consecutive_failures = 0;
    }

    /// Cancelled on any exit from `connected`.
    pub fn cancel_timer(&self) {
        let mut state = self.state.write();
        state.armed = false;
        state.last_sent_at = None;
    }

    /// Any inbound frame counts as liveness, independent of whether it's a
    /// true heartbeat reply (teacher's `record_message` idiom).
    pub fn record_message(&self) {
        self.state.write().last_seen_at = Some(Instant::now());
    }

    /// Called when the loop observes a reply that completes a heartbeat
    /// round trip (a pong for `ping_pong`, or the matching application
    /// reply for `application_request`). Per the Open Question in §9,
    /// `heartbeat.pong` telemetry fires only when there was a genuine
    /// send-to-receive pairing; returns the RTT in that case.
    pub fn record_reply(&self) -> Option<u64> {
        let mut state = self.state.write();
        let now = Instant::now();
        state.last_seen_at = Some(now);
        let rtt_ms = state
            .last_sent_at
            .take()
            .map(|sent| now.saturating_duration_since(sent).as_millis() as u64);
        if let Some(rtt_ms) = rtt_ms {
            state.consecutive_failures = 0;
            let mode_label = match self.mode {
                HeartbeatMode::PingPong => "ping_pong",
                HeartbeatMode::ApplicationRequest => "application_request",
                HeartbeatMode::Disabled => "disabled",
            };
            self.telemetry.heartbeat_pong(mode_label, rtt_ms);
        }
        rtt_ms
    }

    /// Called by the loop's heartbeat tick. Returns `Some(fault)` if the
    /// silence exceeds `interval_ms * K` (the caller treats this as a
    /// recoverable transport error), or records a send and returns the
    /// action to transmit otherwise.
    pub fn on_tick(&self, request_body: Option<Value>) -> Result<HeartbeatAction, ()> {
        if matches!(self.mode, HeartbeatMode::Disabled) {
            return Ok(HeartbeatAction::None);
        }
        let now = Instant::now();
        let timeout = Duration::from_millis(self.interval_ms * TIMEOUT_FACTOR as u64);
        {
            let mut state = self.state.write();
            let silent_for = state
                .last_seen_at
                .map(|seen| now.saturating_duration_since(seen))
                .unwrap_or(Duration::ZERO);
            if silent_for > timeout {
                state.consecutive_failures += 1;
                return Err(());
            }
        }
        let action = match self.mode {
            HeartbeatMode::PingPong => HeartbeatAction::Ping,
            HeartbeatMode::ApplicationRequest => {
                HeartbeatAction::Send(request_body.unwrap_or_else(|| {
                    serde_json::json!({"method": "heartbeat"})
                }))
            }
            HeartbeatMode::Disabled => HeartbeatAction::None,
        };
        self.state.write().last_sent_at = Some(now);
        Ok(action)
    }

    pub fn health(&self) -> HeartbeatHealth {
        let state = self.state.read();
        HeartbeatHealth {
            mode: self.mode,
            last_seen_ms_ago: state.last_seen_at.map(|t| t.elapsed().as_millis() as u64),
            consecutive_failures: state.consecutive_failures,
            timer_armed: state.armed,
        }
    }
}
