use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Breaker position for an upstream lookup service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive transport failures before the breaker opens.
    pub failure_threshold: u32,
    /// How long the breaker stays open before one probe is let through.
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct Tracker {
    state: CircuitState,
    failures: u32,
    opened_at: Option<Instant>,
}

/// Stops a run from hammering an unreachable service. After repeated
/// transport failures callers hold back until the open timeout elapses, then
/// one half-open request decides whether the breaker closes again.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    tracker: Mutex<Tracker>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            tracker: Mutex::new(Tracker {
                state: CircuitState::Closed,
                failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn allow_request(&self) -> bool {
        let mut tracker = self.lock();
        if tracker.state != CircuitState::Open {
            return true;
        }

        let cooled_down = tracker
            .opened_at
            .is_none_or(|opened_at| opened_at.elapsed() >= self.config.open_timeout);
        if cooled_down {
            tracker.state = CircuitState::HalfOpen;
            tracker.opened_at = None;
        }
        cooled_down
    }

    /// Time left before an open breaker lets a half-open request through.
    /// `None` unless the breaker is open.
    pub fn retry_after(&self) -> Option<Duration> {
        let tracker = self.lock();
        if tracker.state != CircuitState::Open {
            return None;
        }
        let elapsed = tracker
            .opened_at
            .map_or(self.config.open_timeout, |opened_at| opened_at.elapsed());
        Some(self.config.open_timeout.saturating_sub(elapsed))
    }

    pub fn record_success(&self) {
        let mut tracker = self.lock();
        tracker.state = CircuitState::Closed;
        tracker.failures = 0;
        tracker.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut tracker = self.lock();
        tracker.failures = tracker.failures.saturating_add(1);
        let trip = tracker.state == CircuitState::HalfOpen
            || tracker.failures >= self.config.failure_threshold;
        if trip {
            tracker.state = CircuitState::Open;
            tracker.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().failures
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tracker> {
        self.tracker
            .lock()
            .expect("circuit breaker lock is not poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_once_failures_reach_the_threshold() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_secs(60),
        });

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.allow_request());

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow_request());
    }

    #[test]
    fn retry_after_counts_down_only_while_open() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            open_timeout: Duration::from_secs(60),
        });
        assert_eq!(breaker.retry_after(), None);

        breaker.record_failure();

        let remaining = breaker.retry_after().expect("breaker is open");
        assert!(remaining > Duration::from_secs(59));
        assert!(remaining <= Duration::from_secs(60));

        breaker.record_success();
        assert_eq!(breaker.retry_after(), None);
    }

    #[test]
    fn probe_after_timeout_then_success_closes() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            open_timeout: Duration::from_millis(1),
        });

        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(3));

        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[test]
    fn failed_probe_reopens_immediately() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 3,
            open_timeout: Duration::from_millis(1),
        });
        for _ in 0..3 {
            breaker.record_failure();
        }
        std::thread::sleep(Duration::from_millis(3));
        assert!(breaker.allow_request());

        breaker.record_failure();

        assert_eq!(breaker.state(), CircuitState::Open);
    }
}
