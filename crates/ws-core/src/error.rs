//! Error taxonomy for the connection core.
//!
//! The variants are a closed set of *kinds*, not a grab-bag of wrapped
//! library errors: callers match on these to decide whether to retry, and
//! the reconnection policy classifies each one as recoverable or fatal.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WsError {
    // Transport connection errors (recoverable).
    #[error("connection refused")]
    ConnectionRefused,
    #[error("dns lookup failed: {0}")]
    DnsNotFound(String),
    #[error("host unreachable")]
    HostUnreachable,
    #[error("network unreachable")]
    NetworkUnreachable,
    #[error("tls handshake failed: {0}")]
    TlsHandshakeFailed(String),
    #[error("transport down")]
    TransportDown,
    #[error("transport error: {0}")]
    TransportError(String),
    #[error("connection timed out")]
    ConnectionTimeout,

    // Protocol errors (fatal).
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("frame too large")]
    FrameTooLarge,
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    // Authentication errors (fatal).
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    TokenExpired,

    // Operational errors.
    #[error("not connected")]
    NotConnected,
    #[error("correlation timeout")]
    CorrelationTimeout,
    #[error("rate limited")]
    RateLimited,
    #[error("queue full")]
    QueueFull,
    #[error("max reconnection attempts exceeded")]
    MaxReconnectionAttempts,
    #[error("no connections available")]
    NoConnections,

    // Configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("closed")]
    Closed,
}

pub type WsResult<T> = Result<T, WsError>;

/// How the reconnection policy (§4.5) should treat an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Recoverable,
    Fatal,
}

impl WsError {
    pub fn classify(&self) -> ErrorClass {
        use WsError::*;
        match self {
            ConnectionRefused
            | DnsNotFound(_)
            | HostUnreachable
            | NetworkUnreachable
            | TlsHandshakeFailed(_)
            | TransportDown
            | TransportError(_)
            | ConnectionTimeout => ErrorClass::Recoverable,

            InvalidFrame(_)
            | FrameTooLarge
            | MalformedFrame(_)
            | Unauthorized
            | InvalidCredentials
            | TokenExpired => ErrorClass::Fatal,

            // Operational/config errors never drive reconnect decisions
            // directly, but classify() is only consulted for errors that
            // can originate from a connection attempt; treat the rest as
            // fatal so an unexpected kind never triggers silent retries.
            NotConnected
            | CorrelationTimeout
            | RateLimited
            | QueueFull
            | MaxReconnectionAttempts
            | NoConnections
            | InvalidConfig(_)
            | Closed => ErrorClass::Fatal,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.classify() == ErrorClass::Recoverable
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for WsError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as TErr;
        match err {
            TErr::ConnectionClosed | TErr::AlreadyClosed => WsError::TransportDown,
            TErr::Io(io_err) => classify_io_error(&io_err),
            TErr::Tls(tls_err) => WsError::TlsHandshakeFailed(tls_err.to_string()),
            TErr::Capacity(_) => WsError::FrameTooLarge,
            TErr::Protocol(p) => WsError::InvalidFrame(p.to_string()),
            TErr::Utf8 => WsError::MalformedFrame("invalid utf8".to_string()),
            TErr::Http(resp) => classify_http_status(resp.status().as_u16()),
            other => WsError::TransportError(other.to_string()),
        }
    }
}

fn classify_io_error(io_err: &std::io::Error) -> WsError {
    use std::io::ErrorKind::*;
    match io_err.kind() {
        ConnectionRefused => WsError::ConnectionRefused,
        TimedOut => WsError::ConnectionTimeout,
        NotFound | AddrNotAvailable => WsError::HostUnreachable,
        _ => {
            let msg = io_err.to_string();
            if msg.contains("nodename nor servname") || msg.contains("Name or service not known") {
                WsError::DnsNotFound(msg)
            } else {
                WsError::TransportError(msg)
            }
        }
    }
}

fn classify_http_status(status: u16) -> WsError {
    match status {
        401 => WsError::Unauthorized,
        403 => WsError::InvalidCredentials,
        _ => WsError::TransportError(format!("http upgrade rejected: {status}")),
    }
}

impl From<serde_json::Error> for WsError {
    fn from(err: serde_json::Error) -> Self {
        WsError::MalformedFrame(err.to_string())
    }
}
