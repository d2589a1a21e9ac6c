use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ids::RunId, wei::Wei};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Standard,
    Sequential,
    Parallel,
    Diversified,
    Stress,
    Deployment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Evm,
    Defi,
    Load,
    Finality,
}

impl TestType {
    /// Minimum per-phase success rate for this phase to count as
    /// "successful".
    #[must_use]
    pub const fn success_floor(self) -> f64 {
        match self {
            Self::Evm => 1.0,
            Self::Defi => 0.9,
            Self::Load | Self::Finality => 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Gas,
    Timeout,
    Nonce,
    Connection,
    Revert,
    Ratelimit,
    Unknown,
}

impl ErrorCategory {
    /// Reverts are never retried; everything else may be, subject to the
    /// network's retry policy.
    #[must_use]
    pub const fn is_retryable_by_default(self) -> bool {
        !matches!(self, Self::Revert)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub tests: u64,
    pub successes: u64,
    pub failures: u64,
    pub gas_used: u128,
    pub cost_native: u128,
    pub cost_usd_cents: u64,
}

impl Totals {
    /// `successes + failures` never exceeds `tests`.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.successes + self.failures <= self.tests
    }

    pub fn add_result(&mut self, result: &TestResult) {
        self.tests += 1;
        if result.success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.gas_used += result.gas_used.as_u128();
        self.cost_native += result.cost_native.as_u128();
        self.cost_usd_cents += result.cost_usd_cents;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub run_id: RunId,
    pub internal_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub mode: RunMode,
    pub parallel: bool,
    pub network_ids: Vec<String>,
    pub test_types: Vec<TestType>,
    pub totals: Totals,
    pub raw_config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkResult {
    pub run_id: RunId,
    pub network_id: String,
    pub chain_id: u64,
    pub totals: Totals,
    pub success: bool,
    pub block_number_start: Option<u64>,
    pub block_number_end: Option<u64>,
    pub average_gas_price: Option<Wei>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub run_id: RunId,
    pub network_id: String,
    pub test_type: TestType,
    pub test_name: String,
    pub success: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_ms: u64,
    pub gas_used: Wei,
    pub gas_price: Wei,
    pub tx_hash: Option<String>,
    pub block_number: Option<u64>,
    pub error_message: Option<String>,
    pub error_category: Option<ErrorCategory>,
    pub cost_native: Wei,
    pub cost_usd_cents: u64,
    pub metadata: serde_json::Value,
}

impl TestResult {
    /// A failed result must carry a reason, and a result with a
    /// transaction hash must carry the block it landed in.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        if !self.success && self.error_message.is_none() && self.error_category.is_none() {
            return false;
        }
        if self.tx_hash.is_some() && self.block_number.is_none() {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_result() -> TestResult {
        TestResult {
            run_id: RunId::new(),
            network_id: "sepolia".into(),
            test_type: TestType::Evm,
            test_name: "ecrecover".into(),
            success: true,
            start: Utc::now(),
            end: Utc::now(),
            duration_ms: 10,
            gas_used: Wei(21_000),
            gas_price: Wei::from_gwei(1),
            tx_hash: None,
            block_number: None,
            error_message: None,
            error_category: None,
            cost_native: Wei::ZERO,
            cost_usd_cents: 0,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn failed_result_without_reason_is_malformed() {
        let mut result = base_result();
        result.success = false;
        assert!(!result.is_well_formed());
        result.error_category = Some(ErrorCategory::Revert);
        assert!(result.is_well_formed());
    }

    #[test]
    fn tx_hash_without_block_is_malformed() {
        let mut result = base_result();
        result.tx_hash = Some("0xabc".into());
        assert!(!result.is_well_formed());
        result.block_number = Some(10);
        assert!(result.is_well_formed());
    }

    #[test]
    fn totals_invariant_holds_after_add_result() {
        let mut totals = Totals::default();
        totals.add_result(&base_result());
        assert!(totals.is_consistent());
        assert_eq!(totals.tests, 1);
        assert_eq!(totals.successes, 1);
    }
}
