use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use orchestrator_types::ErrorCategory;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::breaker::{Admission, CircuitBreaker};
use crate::classify::Classify;
use crate::error::RetryError;
use crate::policy::{PolicyTable, RetryPolicy};
use crate::backoff::compute_delay;

/// Extra context attached to retry log lines; callers pass whatever
/// identifies the operation (a run id, a test name) without the Retry
/// Manager needing to know its shape.
pub type RetryContext = Option<String>;

/// Supervises retried operations: one shared structure owns the policy
/// table and a breaker per chain, and `execute` wraps a single async call
/// with backoff and breaker admission.
pub struct RetryManager {
    policies: PolicyTable,
    breakers: Mutex<HashMap<u64, Arc<CircuitBreaker>>>,
    failure_threshold: u32,
    recovery_timeout: Duration,
}

impl RetryManager {
    #[must_use]
    pub fn new(policies: PolicyTable, failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            policies,
            breakers: Mutex::new(HashMap::new()),
            failure_threshold,
            recovery_timeout,
        }
    }

    /// Resolves the retry budget for `chain_id`/`category`, for callers
    /// that drive their own retry loop instead of using [`Self::execute`]
    /// (the Test Runner's whole-phase retries).
    #[must_use]
    pub fn policy(&self, chain_id: u64, category: ErrorCategory) -> RetryPolicy {
        self.policies.resolve(chain_id, category)
    }

    async fn breaker_for(&self, chain_id: u64) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().await;
        breakers
            .entry(chain_id)
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.failure_threshold, self.recovery_timeout)))
            .clone()
    }

    /// Runs `op` until it succeeds, its classified error isn't retryable,
    /// or the resolved policy's `max_retries` is exhausted. `chain_id`
    /// selects both the policy override table and the per-chain circuit
    /// breaker; `max_retries_override` lets a caller tighten (never
    /// loosen) the resolved policy for one call.
    pub async fn execute<T, E, F, Fut>(
        &self,
        chain_id: u64,
        max_retries_override: Option<u32>,
        ctx: RetryContext,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        E: Classify,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let breaker = self.breaker_for(chain_id).await;

        let mut attempt: u32 = 0;

        loop {
            match breaker.try_acquire().await {
                Admission::Allowed => {}
                Admission::Rejected { retry_after } => {
                    return Err(RetryError::BreakerOpen {
                        retry_after_ms: retry_after.as_millis() as u64,
                    });
                }
            }

            match op().await {
                Ok(value) => {
                    breaker.record_success().await;
                    return Ok(value);
                }
                Err(error) => {
                    attempt += 1;
                    let category = error.category();
                    breaker.record_failure().await;

                    let policy = self.policies.resolve(chain_id, category);
                    let max_retries = max_retries_override
                        .map_or(policy.max_retries, |cap| cap.min(policy.max_retries));

                    if !category.is_retryable_by_default() || attempt > max_retries {
                        warn!(
                            ctx = ctx.as_deref().unwrap_or("-"),
                            chain_id,
                            attempts = attempt,
                            category = ?category,
                            "retry budget exhausted"
                        );
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            source: error,
                        });
                    }

                    let delay = compute_delay(attempt, policy.base_delay_ms);
                    debug!(
                        ctx = ctx.as_deref().unwrap_or("-"),
                        chain_id,
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        category = ?category,
                        "retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug)]
    struct Boom(ErrorCategory);

    impl Classify for Boom {
        fn category(&self) -> ErrorCategory {
            self.0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_within_budget() {
        let manager = RetryManager::new(PolicyTable::new(), 100, Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let result: Result<&str, RetryError<Boom>> = manager
            .execute(1, None, None, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Boom(ErrorCategory::Timeout))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn revert_is_never_retried() {
        let manager = RetryManager::new(PolicyTable::new(), 100, Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<Boom>> = manager
            .execute(1, None, None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Boom(ErrorCategory::Revert)) }
            })
            .await;
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn max_retries_override_caps_but_never_raises_policy() {
        let mut policies = PolicyTable::new();
        policies.set_override(7, ErrorCategory::Timeout, RetryPolicy::new(5, 10));
        let manager = RetryManager::new(policies, 100, Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<Boom>> = manager
            .execute(7, Some(1), None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Boom(ErrorCategory::Timeout)) }
            })
            .await;
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 2, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn breaker_open_short_circuits_before_calling_op() {
        let manager = RetryManager::new(PolicyTable::new(), 1, Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let _: Result<(), RetryError<Boom>> = manager
            .execute(9, None, None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Boom(ErrorCategory::Timeout)) }
            })
            .await;
        let calls_after_first = calls.load(Ordering::SeqCst);

        let result: Result<(), RetryError<Boom>> = manager
            .execute(9, None, None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;
        assert!(matches!(result, Err(RetryError::BreakerOpen { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
    }
}
