//! Request Correlator (§4.3): tracks in-flight JSON-RPC requests by id,
//! arms per-request timeouts, resolves or fails waiters.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::WsError;
use crate::message::RequestId;
use crate::telemetry::Telemetry;

pub use crate::message::extract_id;

/// What the parked `send` caller is eventually signalled with.
pub type Waiter = oneshot::Sender<Result<(Value, u64), WsError>>;

struct Entry {
    waiter: Waiter,
    start: Instant,
}

/// Exactly one entry per id at any time (§3): an id collision on insert is
/// a programming error, guarded against by the internal monotonic id
/// counter `Connection` uses to mint request ids.
pub struct RequestCorrelator {
    entries: Mutex<HashMap<RequestId, Entry>>,
    telemetry: Arc<dyn Telemetry>,
}

impl RequestCorrelator {
    pub fn new(telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            telemetry,
        }
    }

    /// Insert `(waiter, monotonic_now)` under `id`. The caller is
    /// responsible for arming the timeout timer (a `DelayQueue` entry owned
    /// by the Connection event loop) and routing its fire back to
    /// [`RequestCorrelator::timeout`].
    pub fn track(&self, id: RequestId, waiter: Waiter, timeout_ms: u64) {
        let mut entries = self.entries.lock();
        debug_assert!(
            !entries.contains_key(&id),
            "duplicate request id inserted into correlator"
        );
        entries.insert(
            id.clone(),
            Entry {
                waiter,
                start: Instant::now(),
            },
        );
        self.telemetry.correlator_track(&id.to_string(), timeout_ms);
    }

    /// On matching response: pop the entry, compute RTT, signal the waiter.
    /// Returns the measured RTT in milliseconds on a hit.
    pub fn resolve(&self, id: &RequestId, body: Value) -> Option<u64> {
        let entry = self.entries.lock().remove(id)?;
        let rtt_ms = entry.start.elapsed().as_millis() as u64;
        let _ = entry.waiter.send(Ok((body, rtt_ms)));
        self.telemetry.correlator_resolve(&id.to_string(), rtt_ms);
        Some(rtt_ms)
    }

    /// On timeout fire: pop the entry, signal with `CorrelationTimeout`.
    pub fn timeout(&self, id: &RequestId) -> bool {
        let Some(entry) = self.entries.lock().remove(id) else {
            return false;
        };
        let _ = entry.waiter.send(Err(WsError::CorrelationTimeout));
        self.telemetry.correlator_timeout(&id.to_string());
        true
    }

    /// On Connection teardown: drain the map, signal every waiter with the
    /// teardown reason.
    pub fn teardown(&self, reason: WsError) {
        let drained: Vec<Entry> = self.entries.lock().drain().map(|(_, e)| e).collect();
        for entry in drained {
            let _ = entry.waiter.send(Err(reason.clone()));
        }
    }

    pub fn pending_count(&self) -> usize {
        self.entries.lock().len()
    }
}
