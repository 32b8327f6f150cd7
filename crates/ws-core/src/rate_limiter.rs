//! Rate Limiter (§4.6): token bucket with a bounded FIFO queue and
//! tiered pressure telemetry. The limiter owns one process-wide table
//! keyed by `name` (§3, §4.6 "Resource discipline") — callers must
//! explicitly [`shutdown`] it; it is *not* freed when a Connection using it
//! is dropped, because limiters commonly outlive individual connections.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::telemetry::Telemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureLevel {
    None,
    Low,
    Medium,
    High,
}

impl PressureLevel {
    fn for_ratio(ratio: f64) -> Self {
        if ratio >= 0.75 {
            PressureLevel::High
        } else if ratio >= 0.50 {
            PressureLevel::Medium
        } else if ratio >= 0.25 {
            PressureLevel::Low
        } else {
            PressureLevel::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PressureLevel::None => "none",
            PressureLevel::Low => "low",
            PressureLevel::Medium => "medium",
            PressureLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Ok,
    RateLimited,
    QueueFull,
}

#[derive(Debug, Clone)]
pub struct RateLimiterStatus {
    pub tokens: u64,
    pub queue_size: usize,
    pub pressure_level: PressureLevel,
    pub suggested_delay_ms: u64,
}

/// Caller-provided cost table: credit-based, weight-based, or uniform.
pub type CostFn = Arc<dyn Fn(&str) -> u64 + Send + Sync>;

pub struct RateLimiterConfig {
    pub capacity: u64,
    pub refill_amount: u64,
    pub refill_interval_ms: u64,
    pub max_queue_size: usize,
    pub cost_fn: CostFn,
}

impl RateLimiterConfig {
    pub fn uniform_cost(capacity: u64, refill_amount: u64, refill_interval_ms: u64, max_queue_size: usize) -> Self {
        Self {
            capacity,
            refill_amount,
            refill_interval_ms,
            max_queue_size,
            cost_fn: Arc::new(|_tag: &str| 1),
        }
    }
}

struct Inner {
    tokens: u64,
    queue: VecDeque<(String, u64)>,
    pressure: PressureLevel,
}

pub struct RateLimiterState {
    name: String,
    capacity: u64,
    refill_amount: u64,
    refill_interval_ms: u64,
    max_queue_size: usize,
    cost_fn: CostFn,
    inner: Mutex<Inner>,
    telemetry: Arc<dyn Telemetry>,
    refill_task: Mutex<Option<JoinHandle<()>>>,
}

pub type RateLimiterHandle = Arc<RateLimiterState>;

static TABLE: Lazy<Mutex<HashMap<String, RateLimiterHandle>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the existing handle for `name` if present, otherwise creates one
/// and starts its background refill task.
pub fn init(name: &str, config: RateLimiterConfig, telemetry: Arc<dyn Telemetry>) -> RateLimiterHandle {
    let mut table = TABLE.lock();
    if let Some(existing) = table.get(name) {
        return existing.clone();
    }
    let state = Arc::new(RateLimiterState {
        name: name.to_string(),
        capacity: config.capacity,
        refill_amount: config.refill_amount,
        refill_interval_ms: config.refill_interval_ms,
        max_queue_size: config.max_queue_size,
        cost_fn: config.cost_fn,
        inner: Mutex::new(Inner {
            tokens: config.capacity,
            queue: VecDeque::new(),
            pressure: PressureLevel::None,
        }),
        telemetry,
        refill_task: Mutex::new(None),
    });

    let bg_state = state.clone();
    let interval_ms = state.refill_interval_ms.max(1);
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            ticker.tick().await;
            bg_state.refill();
        }
    });
    *state.refill_task.lock() = Some(handle);

    table.insert(name.to_string(), state.clone());
    state
}

/// Idempotent: removing an already-removed name is a no-op.
pub fn shutdown(name: &str) {
    if let Some(state) = TABLE.lock().remove(name) {
        if let Some(handle) = state.refill_task.lock().take() {
            handle.abort();
        }
    }
}

impl RateLimiterState {
    fn recompute_pressure_locked(&self, inner: &mut Inner) {
        let ratio = inner.queue.len() as f64 / self.max_queue_size.max(1) as f64;
        let new_level = PressureLevel::for_ratio(ratio);
        if new_level != inner.pressure {
            self.telemetry
                .rate_limiter_pressure(&self.name, new_level.as_str(), inner.pressure.as_str());
            inner.pressure = new_level;
        }
    }

    pub fn consume(&self, tag: &str) -> ConsumeOutcome {
        let cost = (self.cost_fn)(tag);
        let mut inner = self.inner.lock();
        if inner.tokens >= cost {
            inner.tokens -= cost;
            self.telemetry.rate_limiter_tokens(&self.name, inner.tokens);
            return ConsumeOutcome::Ok;
        }
        if inner.queue.len() >= self.max_queue_size {
            return ConsumeOutcome::QueueFull;
        }
        inner.queue.push_back((tag.to_string(), cost));
        self.telemetry
            .rate_limiter_queue_size(&self.name, inner.queue.len());
        self.recompute_pressure_locked(&mut inner);
        ConsumeOutcome::RateLimited
    }

    /// Adds `refill_amount` clamped to `capacity` (never unbounded — see
    /// the Open Question in §9), then drains the queue while the head's
    /// cost fits in the now-available tokens.
    pub fn refill(&self) {
        let mut inner = self.inner.lock();
        inner.tokens = (inner.tokens + self.refill_amount).min(self.capacity);
        while let Some((_, cost)) = inner.queue.front() {
            if *cost <= inner.tokens {
                inner.tokens -= *cost;
                inner.queue.pop_front();
            } else {
                break;
            }
        }
        self.telemetry.rate_limiter_tokens(&self.name, inner.tokens);
        self.telemetry
            .rate_limiter_queue_size(&self.name, inner.queue.len());
        self.recompute_pressure_locked(&mut inner);
    }

    pub fn status(&self) -> RateLimiterStatus {
        let inner = self.inner.lock();
        let suggested_delay_ms = match inner.pressure {
            PressureLevel::None => 0,
            PressureLevel::Low => self.refill_interval_ms,
            PressureLevel::Medium => self.refill_interval_ms * 2,
            PressureLevel::High => self.refill_interval_ms * 4,
        };
        RateLimiterStatus {
            tokens: inner.tokens,
            queue_size: inner.queue.len(),
            pressure_level: inner.pressure,
            suggested_delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::null;

    fn fresh(name: &str, cfg: RateLimiterConfig) -> RateLimiterHandle {
        shutdown(name);
        init(name, cfg, null())
    }

    #[tokio::test]
    async fn tokens_never_leave_bounds() {
        let handle = fresh(
            "test-bounds",
            RateLimiterConfig::uniform_cost(10, 3, 1_000_000, 5),
        );
        for _ in 0..20 {
            handle.consume("x");
            let status = handle.status();
            assert!(status.tokens <= 10);
        }
        handle.refill();
        assert!(handle.status().tokens <= 10);
        shutdown("test-bounds");
    }

    #[tokio::test]
    async fn pressure_escalates_at_scenario_thresholds() {
        shutdown("test-pressure");
        let cost_fn: CostFn = Arc::new(|_| 10);
        let handle = init(
            "test-pressure",
            RateLimiterConfig {
                capacity: 1,
                refill_amount: 0,
                refill_interval_ms: 1_000_000,
                max_queue_size: 20,
                cost_fn,
            },
            null(),
        );

        for _ in 0..5 {
            handle.consume("req");
        }
        assert_eq!(handle.status().pressure_level, PressureLevel::Low);

        for _ in 0..5 {
            handle.consume("req");
        }
        assert_eq!(handle.status().pressure_level, PressureLevel::Medium);

        for _ in 0..5 {
            handle.consume("req");
        }
        assert_eq!(handle.status().pressure_level, PressureLevel::High);

        shutdown("test-pressure");
    }

    #[tokio::test]
    async fn queue_full_after_k_rate_limited_results() {
        shutdown("test-queue-full");
        let handle = init(
            "test-queue-full",
            RateLimiterConfig::uniform_cost(0, 0, 1_000_000, 3),
            null(),
        );
        for _ in 0..3 {
            assert_eq!(handle.consume("req"), ConsumeOutcome::RateLimited);
        }
        assert_eq!(handle.consume("req"), ConsumeOutcome::QueueFull);
        shutdown("test-queue-full");
    }

    #[tokio::test]
    async fn refill_drains_queue_fifo() {
        shutdown("test-drain");
        let handle = init(
            "test-drain",
            RateLimiterConfig::uniform_cost(0, 5, 1_000_000, 10),
            null(),
        );
        assert_eq!(handle.consume("a"), ConsumeOutcome::RateLimited);
        assert_eq!(handle.consume("b"), ConsumeOutcome::RateLimited);
        handle.refill();
        assert_eq!(handle.status().queue_size, 1);
        handle.refill();
        assert_eq!(handle.status().queue_size, 0);
        shutdown("test-drain");
    }

    #[tokio::test]
    async fn init_is_idempotent_per_name() {
        shutdown("test-idempotent");
        let a = init(
            "test-idempotent",
            RateLimiterConfig::uniform_cost(10, 1, 1_000_000, 10),
            null(),
        );
        let b = init(
            "test-idempotent",
            RateLimiterConfig::uniform_cost(999, 999, 1, 999),
            null(),
        );
        assert!(Arc::ptr_eq(&a, &b));
        shutdown("test-idempotent");
    }

    #[tokio::test]
    async fn double_shutdown_is_idempotent() {
        shutdown("test-double-shutdown");
        init(
            "test-double-shutdown",
            RateLimiterConfig::uniform_cost(1, 1, 1_000_000, 1),
            null(),
        );
        shutdown("test-double-shutdown");
        shutdown("test-double-shutdown");
    }
}
