//! `SendHandle` (SPEC_FULL §14): a cloneable, channel-backed handle for
//! queuing outbound sends from any task without holding the Connection
//! loop's exclusive access. Generalized from the teacher's
//! `WsWriteHandle`, dropping the trading-specific post/inflight counting
//! (no counterpart in this core) while keeping the rate-limit/not-ready/
//! channel-closed error triad.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::connection::ConnectionStatus;
use crate::rate_limiter::{ConsumeOutcome, RateLimiterHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    RateLimited,
    QueueFull,
    NotConnected,
    ChannelClosed,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::RateLimited => write!(f, "rate limited"),
            SendError::QueueFull => write!(f, "rate limiter queue full"),
            SendError::NotConnected => write!(f, "not connected"),
            SendError::ChannelClosed => write!(f, "connection loop channel closed"),
        }
    }
}

impl std::error::Error for SendError {}

#[derive(Clone)]
pub struct SendHandle {
    tx: mpsc::UnboundedSender<String>,
    rate_limiter: Option<RateLimiterHandle>,
    status: Arc<RwLock<ConnectionStatus>>,
}

impl SendHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<String>,
        rate_limiter: Option<RateLimiterHandle>,
        status: Arc<RwLock<ConnectionStatus>>,
    ) -> Self {
        Self {
            tx,
            rate_limiter,
            status,
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.status.read() == ConnectionStatus::Connected
    }

    /// Fire-and-forget: checks connectivity and rate limit synchronously,
    /// then queues the raw text for the Connection loop to write.
    pub fn send_text(&self, text: String) -> Result<(), SendError> {
        if !self.is_connected() {
            return Err(SendError::NotConnected);
        }
        if let Some(limiter) = &self.rate_limiter {
            match limiter.consume("send_handle") {
                ConsumeOutcome::Ok => {}
                ConsumeOutcome::RateLimited => return Err(SendError::RateLimited),
                ConsumeOutcome::QueueFull => return Err(SendError::QueueFull),
            }
        }
        self.tx
            .send(text)
            .map_err(|_| SendError::ChannelClosed)
    }
}
