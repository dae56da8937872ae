use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Spaces outgoing requests at least `min_interval` apart.
///
/// The first request passes immediately; a burst of one means no two
/// requests ever share an interval.
#[derive(Clone)]
pub struct RequestThrottle {
    limiter: Arc<DirectRateLimiter>,
    min_interval: Duration,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        let min_interval = min_interval.max(Duration::from_millis(1));
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_for_interval(min_interval))),
            min_interval,
        }
    }

    /// One request per second, the public Nominatim usage policy.
    pub fn per_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Whether a request could go out right now. Consumes the permit when it can.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("min_interval", &self.min_interval)
            .finish()
    }
}

fn quota_for_interval(min_interval: Duration) -> Quota {
    let burst = NonZeroU32::new(1).expect("one is non-zero");
    Quota::with_period(min_interval)
        .expect("interval is always greater than zero")
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn second_request_in_the_same_interval_is_held_back() {
        let throttle = RequestThrottle::new(Duration::from_secs(60));

        assert!(throttle.try_acquire());
        assert!(!throttle.try_acquire());
    }

    #[tokio::test]
    async fn wait_spaces_requests_by_the_interval() {
        let throttle = RequestThrottle::new(Duration::from_millis(40));
        let started = Instant::now();

        throttle.wait().await;
        throttle.wait().await;
        throttle.wait().await;

        assert!(started.elapsed() >= Duration::from_millis(75));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let throttle = RequestThrottle::new(Duration::ZERO);
        assert_eq!(throttle.min_interval(), Duration::from_millis(1));
    }
}
