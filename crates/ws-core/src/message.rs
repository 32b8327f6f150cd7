//! Inbound frame classification (§4.1 "Inbound-frame routing").
//!
//! A minimal, venue-agnostic JSON envelope: just enough structure to route
//! a decoded frame to the Heartbeat Manager, the Subscription Registry, the
//! Request Correlator, or the user handler, without assuming anything about
//! payload shape beyond `method`/`id`/`params.channel`.

use serde_json::Value;

pub const RESTORE_METHOD: &str = "public/subscribe";
pub const HEARTBEAT_METHOD: &str = "heartbeat";
pub const SUBSCRIPTION_METHOD: &str = "subscription";

/// A JSON-RPC request id: either form is legal and ids are compared by
/// exact value, never coerced across forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Int(i) => write!(f, "{i}"),
            RequestId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl RequestId {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Number(n) => n.as_i64().map(RequestId::Int),
            Value::String(s) => Some(RequestId::Str(s.clone())),
            _ => None,
        }
    }
}

/// Frames larger than this are still parsed (the transport layer already
/// enforces real frame-size limits) but id extraction is skipped as a
/// defensive bound against pathological nesting in unexpectedly huge texts.
const MAX_ID_EXTRACT_BYTES: usize = 1_000_000;

/// Attempt a bounded JSON parse; return the non-null `id` if present.
/// Non-JSON or malformed input returns `None` without raising.
pub fn extract_id(text: &str) -> Option<RequestId> {
    if text.len() > MAX_ID_EXTRACT_BYTES {
        return None;
    }
    let value: Value = serde_json::from_str(text).ok()?;
    let id = value.get("id")?;
    if id.is_null() {
        return None;
    }
    RequestId::from_value(id)
}

/// Classification of a decoded JSON text frame, per the routing rules in
/// §4.1: heartbeat first, then subscription confirmations, then correlated
/// responses, then everything else to the user handler.
#[derive(Debug, Clone)]
pub enum Routed {
    Heartbeat(Value),
    SubscriptionConfirmation { channel: String, raw: Value },
    Response { id: RequestId, body: Value },
    Other(Value),
}

pub fn classify(value: Value) -> Routed {
    if value.get("method").and_then(Value::as_str) == Some(HEARTBEAT_METHOD) {
        return Routed::Heartbeat(value);
    }
    if value.get("method").and_then(Value::as_str) == Some(SUBSCRIPTION_METHOD) {
        if let Some(channel) = value
            .get("params")
            .and_then(|p| p.get("channel"))
            .and_then(Value::as_str)
        {
            return Routed::SubscriptionConfirmation {
                channel: channel.to_string(),
                raw: value,
            };
        }
    }
    if let Some(id_value) = value.get("id") {
        if !id_value.is_null() {
            if let Some(id) = RequestId::from_value(id_value) {
                return Routed::Response { id, body: value };
            }
        }
    }
    Routed::Other(value)
}

/// What an inbound frame decodes to, before JSON classification: binary and
/// non-JSON text are forwarded verbatim to the user handler.
#[derive(Debug, Clone)]
pub enum InboundFrame {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

pub fn decode_text(text: &str) -> InboundFrame {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if value.is_object() => InboundFrame::Json(value),
        _ => InboundFrame::Text(text.to_string()),
    }
}
