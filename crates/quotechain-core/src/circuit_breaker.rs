use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Circuit breaker thresholds and timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Failures within `window` required to open the breaker.
    pub failure_threshold: u32,
    /// Sliding window over which failures are counted.
    pub window: Duration,
    /// How long the breaker stays open before it self-resets.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerInner {
    failures: Vec<Instant>,
    opened_at: Option<Instant>,
}

impl BreakerInner {
    fn prune(&mut self, now: Instant, window: Duration) {
        self.failures
            .retain(|recorded| now.duration_since(*recorded) < window);
    }
}

/// Per-source failure tracker with a sliding window and cooldown-based
/// recovery.
///
/// Once `failure_threshold` failures land inside `window` the breaker opens
/// and rejects attempts. After `cooldown` has elapsed the next `is_open`
/// call clears the failure history and reports closed again; there is no
/// half-open probe step, full traffic resumes immediately.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner::default()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open_at(Instant::now())
    }

    pub fn record_success(&self) {
        let mut inner = self
            .inner
            .lock()
            .expect("circuit breaker lock is not poisoned");
        inner.failures.clear();
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    /// Clock-injected variant of [`CircuitBreaker::is_open`] for
    /// deterministic tests.
    pub fn is_open_at(&self, now: Instant) -> bool {
        let mut inner = self
            .inner
            .lock()
            .expect("circuit breaker lock is not poisoned");
        match inner.opened_at {
            None => false,
            Some(opened_at) => {
                if now.duration_since(opened_at) >= self.config.cooldown {
                    inner.opened_at = None;
                    inner.failures.clear();
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Clock-injected variant of [`CircuitBreaker::record_failure`].
    pub fn record_failure_at(&self, now: Instant) {
        let mut inner = self
            .inner
            .lock()
            .expect("circuit breaker lock is not poisoned");
        inner.prune(now, self.config.window);
        inner.failures.push(now);
        inner.prune(now, self.config.window);
        if inner.failures.len() as u32 >= self.config.failure_threshold {
            inner.opened_at = Some(now);
        }
    }

    pub fn failure_count(&self) -> usize {
        self.inner
            .lock()
            .expect("circuit breaker lock is not poisoned")
            .failures
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, window_secs: u64, cooldown_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(BreakerConfig {
            failure_threshold: threshold,
            window: Duration::from_secs(window_secs),
            cooldown: Duration::from_secs(cooldown_secs),
        })
    }

    #[test]
    fn opens_after_threshold_failures_within_window() {
        let breaker = breaker(3, 60, 120);
        let now = Instant::now();

        breaker.record_failure_at(now);
        breaker.record_failure_at(now + Duration::from_secs(1));
        assert!(!breaker.is_open_at(now + Duration::from_secs(2)));

        breaker.record_failure_at(now + Duration::from_secs(2));
        assert!(breaker.is_open_at(now + Duration::from_secs(3)));
    }

    #[test]
    fn stale_failures_fall_out_of_the_window() {
        let breaker = breaker(3, 60, 120);
        let now = Instant::now();

        breaker.record_failure_at(now);
        breaker.record_failure_at(now + Duration::from_secs(1));
        // Third failure lands after the first has aged out.
        breaker.record_failure_at(now + Duration::from_secs(90));
        assert!(!breaker.is_open_at(now + Duration::from_secs(91)));
        assert_eq!(breaker.failure_count(), 2);
    }

    #[test]
    fn cooldown_expiry_closes_and_clears_history() {
        let breaker = breaker(2, 60, 120);
        let now = Instant::now();

        breaker.record_failure_at(now);
        breaker.record_failure_at(now + Duration::from_secs(1));
        assert!(breaker.is_open_at(now + Duration::from_secs(2)));

        assert!(!breaker.is_open_at(now + Duration::from_secs(121) + Duration::from_secs(1)));
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn success_clears_failures_and_closes() {
        let breaker = breaker(2, 60, 120);
        let now = Instant::now();

        breaker.record_failure_at(now);
        breaker.record_failure_at(now);
        assert!(breaker.is_open_at(now));

        breaker.record_success();
        assert!(!breaker.is_open_at(now));
        assert_eq!(breaker.failure_count(), 0);
    }
}
