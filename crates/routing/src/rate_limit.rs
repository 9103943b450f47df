//! Per-provider token bucket, shared per-provider across the process.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

pub struct RateLimitBucket {
    tokens: Mutex<f64>,
    capacity: f64,
    refill_rate_per_second: f64,
    last_refill: Mutex<DateTime<Utc>>,
}

impl RateLimitBucket {
    pub fn new(capacity: f64, refill_rate_per_second: f64) -> Self {
        Self {
            tokens: Mutex::new(capacity),
            capacity,
            refill_rate_per_second,
            last_refill: Mutex::new(Utc::now()),
        }
    }

    /// Requests-per-minute convenience constructor: capacity = rpm, refill = rpm/60.
    pub fn from_rpm(rpm: u32) -> Self {
        Self::new(rpm as f64, rpm as f64 / 60.0)
    }

    fn refill(&self) {
        let now = Utc::now();
        let mut last_refill = self.last_refill.lock().unwrap();
        let elapsed_seconds = (now - *last_refill).num_milliseconds() as f64 / 1000.0;
        if elapsed_seconds <= 0.0 {
            return;
        }
        let mut tokens = self.tokens.lock().unwrap();
        *tokens = (*tokens + elapsed_seconds * self.refill_rate_per_second).min(self.capacity);
        *last_refill = now;
    }

    /// Non-blocking acquire of a single token.
    pub fn try_acquire(&self) -> bool {
        self.refill();
        let mut tokens = self.tokens.lock().unwrap();
        if *tokens >= 1.0 {
            *tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn available_tokens(&self) -> f64 {
        self.refill();
        *self.tokens.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depletes_tokens_on_acquire() {
        let bucket = RateLimitBucket::new(2.0, 1.0);
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }

    #[test]
    fn from_rpm_sets_capacity_and_refill_rate() {
        let bucket = RateLimitBucket::from_rpm(600);
        assert_eq!(bucket.capacity, 600.0);
        assert_eq!(bucket.refill_rate_per_second, 10.0);
    }
}
