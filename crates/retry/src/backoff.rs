use std::time::Duration;

use rand::Rng;

/// Cap on any single backoff, regardless of how deep the retry loop is.
const MAX_DELAY_MS: u64 = 30_000;

/// Upper bound of the uniform jitter fraction added on top of the
/// exponential term.
const JITTER_MAX: f64 = 0.25;

/// `min(maxDelay, baseDelay * 2^(attempt-1) * (1 + U[0, jitterMax]))`.
/// `attempt` is 1-indexed: the delay before the first retry uses
/// `attempt = 1`.
#[must_use]
pub fn compute_delay(attempt: u32, base_delay_ms: u64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32);
    let exponential = (base_delay_ms as f64) * 2f64.powi(exponent as i32);
    let jitter = rand::thread_rng().gen_range(0.0..JITTER_MAX);
    let with_jitter = exponential * (1.0 + jitter);
    let capped = with_jitter.min(MAX_DELAY_MS as f64);
    Duration::from_millis(capped.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_is_roughly_one_base_delay() {
        let delay = compute_delay(1, 1_000);
        assert!(delay.as_millis() >= 1_000);
        assert!(delay.as_millis() <= 1_250);
    }

    #[test]
    fn delay_grows_exponentially_with_attempt() {
        let first = compute_delay(1, 100).as_millis();
        let third = compute_delay(3, 100).as_millis();
        assert!(third >= first * 3);
    }

    #[test]
    fn delay_never_exceeds_the_cap() {
        let delay = compute_delay(20, 10_000);
        assert!(delay.as_millis() as u64 <= MAX_DELAY_MS);
    }
}
