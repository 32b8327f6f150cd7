//! Reconnection policy (§4.5): pure functions, no state of their own.

use crate::error::WsError;

/// `min(base * 2^attempt, max)`. `attempt` is the zero-based retry count.
pub fn backoff(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    let scaled = base_ms.saturating_mul(1u64 << attempt.min(63));
    scaled.min(max_ms)
}

pub fn should_reconnect(err: &WsError) -> bool {
    err.is_recoverable()
}

pub fn max_retries_exceeded(attempt: u32, limit: u32) -> bool {
    attempt >= limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_saturates_at_max() {
        assert_eq!(backoff(0, 1000, 8000), 1000);
        assert_eq!(backoff(1, 1000, 8000), 2000);
        assert_eq!(backoff(2, 1000, 8000), 4000);
        assert_eq!(backoff(3, 1000, 8000), 8000);
        for attempt in 4..10 {
            assert_eq!(backoff(attempt, 1000, 8000), 8000);
        }
    }

    #[test]
    fn backoff_is_within_base_and_max() {
        for attempt in 0..20u32 {
            let delay = backoff(attempt, 500, 30_000);
            assert!(delay >= 500 && delay <= 30_000);
        }
    }

    #[test]
    fn backoff_is_monotone_non_decreasing() {
        let mut prev = 0;
        for attempt in 0..20u32 {
            let delay = backoff(attempt, 250, 10_000);
            assert!(delay >= prev);
            prev = delay;
        }
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        assert_eq!(backoff(1000, 1000, 30_000), 30_000);
    }

    #[test]
    fn retry_cap_is_inclusive() {
        assert!(!max_retries_exceeded(2, 3));
        assert!(max_retries_exceeded(3, 3));
        assert!(max_retries_exceeded(10, 3));
    }

    #[test]
    fn recoverable_errors_trigger_reconnect() {
        assert!(should_reconnect(&WsError::ConnectionRefused));
        assert!(!should_reconnect(&WsError::Unauthorized));
    }
}
