//! Error Explainer (§4.10): a pure function from an error kind to a
//! human-readable `(message, suggestion, docs_url)` triple. A closed
//! lookup covers the taxonomy in §7; unknown inputs get a generic message
//! that embeds the inspected value instead of raising.

use crate::error::WsError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorExplanation {
    pub message: String,
    pub suggestion: String,
    pub docs_url: Option<String>,
}

fn explanation(message: &str, suggestion: &str, docs_url: Option<&str>) -> ErrorExplanation {
    ErrorExplanation {
        message: message.to_string(),
        suggestion: suggestion.to_string(),
        docs_url: docs_url.map(str::to_string),
    }
}

pub fn explain(err: &WsError) -> ErrorExplanation {
    match err {
        WsError::ConnectionRefused => explanation(
            "the remote endpoint refused the connection",
            "check that the host and port are correct and the service is listening",
            Some("https://docs.rs/ws-core/latest/ws_core/error/index.html#econnrefused"),
        ),
        WsError::DnsNotFound(detail) => explanation(
            &format!("dns lookup failed: {detail}"),
            "verify the hostname resolves from this network",
            None,
        ),
        WsError::HostUnreachable => explanation(
            "the host is unreachable",
            "check routing and firewall rules between this process and the host",
            None,
        ),
        WsError::NetworkUnreachable => explanation(
            "the network is unreachable",
            "check local network connectivity",
            None,
        ),
        WsError::TlsHandshakeFailed(detail) => explanation(
            &format!("tls handshake failed: {detail}"),
            "verify the server certificate is valid and trusted by the system store",
            None,
        ),
        WsError::TransportDown => explanation(
            "the transport closed unexpectedly",
            "this is usually transient; the reconnection policy will retry automatically",
            None,
        ),
        WsError::TransportError(detail) => explanation(
            &format!("transport error: {detail}"),
            "this is usually transient; the reconnection policy will retry automatically",
            None,
        ),
        WsError::ConnectionTimeout => explanation(
            "the connection attempt timed out",
            "increase timeout_ms or check network latency to the host",
            None,
        ),
        WsError::InvalidFrame(detail) => explanation(
            &format!("received an invalid frame: {detail}"),
            "this indicates a protocol mismatch with the server; reconnecting will not help",
            None,
        ),
        WsError::FrameTooLarge => explanation(
            "received a frame exceeding the configured size limit",
            "raise the transport's frame size limit or ask the server to send smaller frames",
            None,
        ),
        WsError::MalformedFrame(detail) => explanation(
            &format!("received a malformed frame: {detail}"),
            "inspect the raw payload; this is usually a server-side encoding bug",
            None,
        ),
        WsError::Unauthorized => explanation(
            "the server rejected the connection as unauthorized",
            "check that credentials are present and correctly formatted",
            None,
        ),
        WsError::InvalidCredentials => explanation(
            "the server rejected the provided credentials",
            "verify the API key or signing secret is correct and not rotated",
            None,
        ),
        WsError::TokenExpired => explanation(
            "the authentication token has expired",
            "refresh the token and reconnect",
            None,
        ),
        WsError::NotConnected => explanation(
            "the connection is not currently established",
            "wait for the connection to reach the connected state before sending",
            None,
        ),
        WsError::CorrelationTimeout => explanation(
            "no response arrived within the configured request timeout",
            "raise request_timeout_ms or check whether the server is overloaded",
            None,
        ),
        WsError::RateLimited => explanation(
            "the outbound rate limiter is out of tokens and the request was queued",
            "retry after the suggested delay or reduce request rate",
            None,
        ),
        WsError::QueueFull => explanation(
            "the outbound rate limiter's queue is full",
            "back off further or increase max_queue_size",
            None,
        ),
        WsError::MaxReconnectionAttempts => explanation(
            "the connection exhausted its reconnection attempts",
            "check connectivity to the endpoint and reconnect explicitly",
            None,
        ),
        WsError::NoConnections => explanation(
            "no connections are available in the pool",
            "add a connection to the pool before routing requests",
            None,
        ),
        WsError::InvalidConfig(reason) => explanation(
            &format!("invalid configuration: {reason}"),
            "fix the configuration and reconnect",
            None,
        ),
        WsError::Closed => explanation(
            "the connection was closed",
            "call connect again to establish a new connection",
            None,
        ),
    }
}
