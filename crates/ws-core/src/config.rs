//! Connection and pool configuration (§4.1, SPEC_FULL §12).
//!
//! Validation rejects bad configuration with a textual reason and no side
//! effect, the same contract the teacher's `AppConfig::from_file` uses.

use crate::error::WsError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeartbeatMode {
    PingPong,
    ApplicationRequest,
    Disabled,
}

impl Default for HeartbeatMode {
    fn default() -> Self {
        HeartbeatMode::PingPong
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub url: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default)]
    pub heartbeat_mode: HeartbeatMode,
    #[serde(default = "default_true")]
    pub reconnect_on_error: bool,
    #[serde(default = "default_true")]
    pub restore_subscriptions: bool,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_latency_buffer_size")]
    pub latency_buffer_size: usize,
    #[serde(default)]
    pub record_to: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

fn default_timeout_ms() -> u64 {
    5000
}
fn default_retry_count() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_heartbeat_interval_ms() -> u64 {
    30_000
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_latency_buffer_size() -> usize {
    100
}
fn default_true() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            headers: Vec::new(),
            timeout_ms: default_timeout_ms(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_mode: HeartbeatMode::default(),
            reconnect_on_error: true,
            restore_subscriptions: true,
            request_timeout_ms: default_request_timeout_ms(),
            latency_buffer_size: default_latency_buffer_size(),
            record_to: None,
            debug: false,
        }
    }
}

impl ConnectionConfig {
    pub fn validate(&self) -> Result<(), WsError> {
        let scheme_end = self
            .url
            .find("://")
            .ok_or_else(|| WsError::InvalidConfig("url missing scheme".to_string()))?;
        let scheme = &self.url[..scheme_end];
        if scheme != "ws" && scheme != "wss" {
            return Err(WsError::InvalidConfig(format!(
                "url scheme must be ws or wss, got {scheme}"
            )));
        }
        let rest = &self.url[scheme_end + 3..];
        let host = rest.split(['/', '?']).next().unwrap_or("");
        if host.is_empty() {
            return Err(WsError::InvalidConfig("url host is empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(WsError::InvalidConfig("timeout_ms must be > 0".to_string()));
        }
        if self.retry_delay_ms == 0 {
            return Err(WsError::InvalidConfig(
                "retry_delay_ms must be > 0".to_string(),
            ));
        }
        if self.max_backoff_ms < self.retry_delay_ms {
            return Err(WsError::InvalidConfig(
                "max_backoff_ms must be >= retry_delay_ms".to_string(),
            ));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(WsError::InvalidConfig(
                "heartbeat_interval_ms must be > 0".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(WsError::InvalidConfig(
                "request_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.latency_buffer_size == 0 {
            return Err(WsError::InvalidConfig(
                "latency_buffer_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_wss(&self) -> bool {
        self.url.starts_with("wss://")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_pool_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_error_decay_ms")]
    pub error_decay_ms: u64,
    #[serde(default = "default_health_gather_timeout_ms")]
    pub health_gather_timeout_ms: u64,
}

fn default_pool_max_attempts() -> u32 {
    3
}
fn default_error_decay_ms() -> u64 {
    60_000
}
fn default_health_gather_timeout_ms() -> u64 {
    100
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_pool_max_attempts(),
            error_decay_ms: default_error_decay_ms(),
            health_gather_timeout_ms: default_health_gather_timeout_ms(),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), WsError> {
        if self.max_attempts == 0 {
            return Err(WsError::InvalidConfig(
                "max_attempts must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ConnectionConfig {
        ConnectionConfig {
            url: "wss://example.com/ws".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_with_url_validates() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut cfg = valid();
        cfg.timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_backoff_below_retry_delay() {
        let mut cfg = valid();
        cfg.retry_delay_ms = 5000;
        cfg.max_backoff_ms = 1000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_bad_scheme() {
        let mut cfg = valid();
        cfg.url = "http://example.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_host() {
        let mut cfg = valid();
        cfg.url = "ws:///path".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_ws_and_wss() {
        let mut cfg = valid();
        cfg.url = "ws://localhost:8080/ws".to_string();
        assert!(cfg.validate().is_ok());
    }
}
