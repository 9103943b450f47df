//! Per-provider circuit breaker: closed → open → half-open → closed.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Shared per-provider across the process (never per-screening).
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    last_state_change: Mutex<DateTime<Utc>>,
    consecutive_failures: AtomicU32,
    half_open_probe_in_flight: AtomicBool,
    failure_threshold: u32,
    open_for: ChronoDuration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, open_for_seconds: u64) -> Self {
        Self {
            state: Mutex::new(BreakerState::Closed),
            last_state_change: Mutex::new(Utc::now()),
            consecutive_failures: AtomicU32::new(0),
            half_open_probe_in_flight: AtomicBool::new(false),
            failure_threshold,
            open_for: ChronoDuration::seconds(open_for_seconds as i64),
        }
    }

    pub fn state(&self) -> BreakerState {
        *self.state.lock().unwrap()
    }

    /// Whether a request may be attempted right now. An open breaker whose
    /// timeout has elapsed transitions to half-open and allows exactly one
    /// probe; subsequent callers are refused until that probe resolves.
    pub fn allow_request(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        match *state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let elapsed = Utc::now() - *self.last_state_change.lock().unwrap();
                if elapsed >= self.open_for {
                    *state = BreakerState::HalfOpen;
                    self.half_open_probe_in_flight.store(true, Ordering::SeqCst);
                    true
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => !self.half_open_probe_in_flight.swap(true, Ordering::SeqCst),
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap();
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.half_open_probe_in_flight.store(false, Ordering::SeqCst);
        if *state == BreakerState::HalfOpen {
            *state = BreakerState::Closed;
            *self.last_state_change.lock().unwrap() = Utc::now();
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == BreakerState::HalfOpen {
            *state = BreakerState::Open;
            *self.last_state_change.lock().unwrap() = Utc::now();
            self.half_open_probe_in_flight.store(false, Ordering::SeqCst);
            self.consecutive_failures.store(0, Ordering::SeqCst);
            return;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.failure_threshold {
            *state = BreakerState::Open;
            *self.last_state_change.lock().unwrap() = Utc::now();
            self.consecutive_failures.store(0, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_consecutive_failures_reach_threshold() {
        let breaker = CircuitBreaker::new(3, 30);
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.allow_request());
    }

    #[test]
    fn success_resets_failure_count() {
        let breaker = CircuitBreaker::new(3, 30);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn half_open_probe_failure_reopens_with_reset_timer() {
        let breaker = CircuitBreaker::new(1, 0);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn half_open_probe_success_closes_breaker() {
        let breaker = CircuitBreaker::new(1, 0);
        breaker.record_failure();
        assert!(breaker.allow_request());
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn half_open_allows_only_one_probe_at_a_time() {
        let breaker = CircuitBreaker::new(1, 0);
        breaker.record_failure();
        assert!(breaker.allow_request());
        assert!(!breaker.allow_request());
    }
}
