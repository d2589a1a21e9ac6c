use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// `Closed -> Open -> HalfOpen -> Closed | Open` breaker guarding a single
/// operation (typically one network's RPC calls). Not generic over the
/// error type: the breaker only needs to know "did it fail", so callers
/// report outcomes explicitly rather than the breaker inspecting errors
/// itself.
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<Inner>,
}

/// Returned by [`CircuitBreaker::try_acquire`] to tell the caller whether
/// it may proceed, and if not, how long until the breaker will allow a
/// trial request through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected { retry_after: Duration },
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Checks whether a call may proceed right now, transitioning
    /// `Open -> HalfOpen` once `recovery_timeout` has elapsed.
    pub async fn try_acquire(&self) -> Admission {
        let mut inner = self.inner.lock().await;
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => Admission::Allowed,
            BreakerState::Open => {
                let opened_at = inner.opened_at.expect("open state always sets opened_at");
                let elapsed = opened_at.elapsed();
                if elapsed >= self.recovery_timeout {
                    inner.state = BreakerState::HalfOpen;
                    info!("circuit breaker entering half-open trial");
                    Admission::Allowed
                } else {
                    Admission::Rejected {
                        retry_after: self.recovery_timeout - elapsed,
                    }
                }
            }
        }
    }

    /// Records a successful call. In `HalfOpen`, one success is enough to
    /// close the breaker and reset the failure count.
    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures = 0;
        if inner.state != BreakerState::Closed {
            info!("circuit breaker closing after successful trial");
        }
        inner.state = BreakerState::Closed;
        inner.opened_at = None;
    }

    /// Records a failed call. A failure while `HalfOpen` reopens
    /// immediately; a failure while `Closed` opens once
    /// `failure_threshold` consecutive failures accumulate.
    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            BreakerState::HalfOpen => {
                warn!("circuit breaker reopening after failed trial");
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
            }
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    warn!(
                        failures = inner.consecutive_failures,
                        "circuit breaker opening"
                    );
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerState::Open => {}
        }
    }

    #[must_use]
    pub async fn is_open(&self) -> bool {
        matches!(self.inner.lock().await.state, BreakerState::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_after_exactly_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure().await;
        breaker.record_failure().await;
        assert!(!breaker.is_open().await);
        breaker.record_failure().await;
        assert!(breaker.is_open().await);
    }

    #[tokio::test]
    async fn success_resets_the_failure_count() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure().await;
        breaker.record_failure().await;
        breaker.record_success().await;
        breaker.record_failure().await;
        breaker.record_failure().await;
        assert!(!breaker.is_open().await);
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_until_recovery_timeout_then_half_opens() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(100));
        breaker.record_failure().await;
        assert_eq!(
            breaker.try_acquire().await,
            Admission::Rejected {
                retry_after: Duration::from_millis(100)
            }
        );
        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(breaker.try_acquire().await, Admission::Allowed);
    }

    #[tokio::test]
    async fn failed_trial_in_half_open_reopens_immediately() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(0));
        breaker.record_failure().await;
        assert_eq!(breaker.try_acquire().await, Admission::Allowed);
        breaker.record_failure().await;
        assert!(breaker.is_open().await);
    }
}
