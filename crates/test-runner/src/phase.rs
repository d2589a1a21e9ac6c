use std::time::Duration;

use orchestrator_types::{TestResult, TestType};

/// Result of running one phase for one network. `success` is whether
/// `success_rate` meets [`TestType::success_floor`] for this phase.
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub success: bool,
    pub test_count: u64,
    pub success_rate: f64,
    pub duration: Duration,
    pub gas_used: u128,
    pub results: Vec<TestResult>,
}

impl PhaseOutcome {
    #[must_use]
    pub fn from_results(test_type: TestType, duration: Duration, results: Vec<TestResult>) -> Self {
        let test_count = results.len() as u64;
        let successes = results.iter().filter(|r| r.success).count() as u64;
        let success_rate = if test_count == 0 { 0.0 } else { successes as f64 / test_count as f64 };
        let gas_used = results.iter().map(|r| r.gas_used.as_u128()).sum();

        Self {
            success: success_rate >= test_type.success_floor(),
            test_count,
            success_rate,
            duration,
            gas_used,
            results,
        }
    }

    /// Names of the sub-tests that did not succeed, used by
    /// `retryUntilSuccess` to rerun only the failures.
    #[must_use]
    pub fn failing_test_names(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.test_name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use orchestrator_types::{RunId, Wei};

    use super::*;

    fn result(name: &str, success: bool) -> TestResult {
        TestResult {
            run_id: RunId::new(),
            network_id: "sepolia".into(),
            test_type: TestType::Defi,
            test_name: name.into(),
            success,
            start: Utc::now(),
            end: Utc::now(),
            duration_ms: 1,
            gas_used: Wei(100),
            gas_price: Wei(1),
            tx_hash: None,
            block_number: None,
            error_message: if success { None } else { Some("boom".into()) },
            error_category: if success { None } else { Some(orchestrator_types::ErrorCategory::Unknown) },
            cost_native: Wei::ZERO,
            cost_usd_cents: 0,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn defi_phase_meets_floor_at_ninety_percent() {
        let results: Vec<_> = (0..10).map(|i| result(&format!("t{i}"), i < 9)).collect();
        let outcome = PhaseOutcome::from_results(TestType::Defi, Duration::from_secs(1), results);
        assert!((outcome.success_rate - 0.9).abs() < 1e-9);
        assert!(outcome.success);
    }

    #[test]
    fn evm_phase_requires_perfect_success() {
        let results: Vec<_> = (0..10).map(|i| result(&format!("t{i}"), i < 9)).collect();
        let outcome = PhaseOutcome::from_results(TestType::Evm, Duration::from_secs(1), results);
        assert!(!outcome.success);
    }

    #[test]
    fn failing_test_names_lists_only_failures() {
        let results = vec![result("a", true), result("b", false)];
        let outcome = PhaseOutcome::from_results(TestType::Defi, Duration::from_secs(1), results);
        assert_eq!(outcome.failing_test_names(), vec!["b".to_string()]);
    }
}
