//! Bounded ring buffer of RTT samples (§4.7).

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySummary {
    pub p50: u64,
    pub p99: u64,
    pub last: u64,
    pub count: usize,
}

pub struct LatencyBuffer {
    capacity: usize,
    samples: VecDeque<u64>,
}

impl LatencyBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// O(1): evicts the oldest sample when at capacity.
    pub fn add(&mut self, rtt_ms: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(rtt_ms);
    }

    pub fn last(&self) -> Option<u64> {
        self.samples.back().copied()
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// `percentile(p)` sorts a snapshot and returns the element at
    /// `round(p/100 * (n-1))`. `None` on an empty buffer.
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let n = sorted.len();
        let idx = ((p / 100.0) * (n - 1) as f64).round() as usize;
        Some(sorted[idx.min(n - 1)])
    }

    pub fn summary(&self) -> Option<LatencySummary> {
        if self.samples.is_empty() {
            return None;
        }
        Some(LatencySummary {
            p50: self.percentile(50.0).unwrap(),
            p99: self.percentile(99.0).unwrap(),
            last: self.last().unwrap(),
            count: self.count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_summary_is_none() {
        let buf = LatencyBuffer::new(10);
        assert!(buf.summary().is_none());
        assert!(buf.percentile(50.0).is_none());
    }

    #[test]
    fn single_sample_answers_every_percentile() {
        let mut buf = LatencyBuffer::new(10);
        buf.add(42);
        assert_eq!(buf.percentile(0.0), Some(42));
        assert_eq!(buf.percentile(50.0), Some(42));
        assert_eq!(buf.percentile(99.0), Some(42));
    }

    #[test]
    fn eviction_at_capacity_keeps_last_and_count() {
        let mut buf = LatencyBuffer::new(3);
        for v in [1, 2, 3, 4, 5] {
            buf.add(v);
        }
        assert_eq!(buf.count(), 3);
        assert_eq!(buf.last(), Some(5));
        let summary = buf.summary().unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.last, 5);
    }

    #[test]
    fn fills_to_capacity_then_stays_there() {
        let mut buf = LatencyBuffer::new(100);
        for v in 0..250u64 {
            buf.add(v);
        }
        assert_eq!(buf.count(), 100);
        assert_eq!(buf.last(), Some(249));
    }

    #[test]
    fn percentile_matches_sorted_index() {
        let mut buf = LatencyBuffer::new(10);
        for v in [5, 1, 4, 2, 3] {
            buf.add(v);
        }
        // sorted: [1,2,3,4,5], n=5, p50 -> round(0.5*4)=2 -> value 3
        assert_eq!(buf.percentile(50.0), Some(3));
        // p99 -> round(0.99*4)=4 -> value 5
        assert_eq!(buf.percentile(99.0), Some(5));
    }
}
