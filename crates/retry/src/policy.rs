use std::collections::HashMap;

use orchestrator_types::ErrorCategory;

/// Resolved retry behaviour for one `(chainId, errorCategory)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }
}

/// Default policy applied when neither a network-specific nor a
/// category-specific override exists. Gas and nonce races tend to clear on
/// the next block, so they get more attempts than connection failures that
/// likely indicate a dead endpoint.
const fn default_policy_for(category: ErrorCategory) -> RetryPolicy {
    match category {
        ErrorCategory::Revert => RetryPolicy::new(0, 0),
        ErrorCategory::Nonce | ErrorCategory::Gas => RetryPolicy::new(5, 500),
        ErrorCategory::Timeout | ErrorCategory::Connection => RetryPolicy::new(3, 1_000),
        ErrorCategory::Ratelimit => RetryPolicy::new(4, 2_000),
        ErrorCategory::Unknown => RetryPolicy::new(2, 1_000),
    }
}

/// Holds per-network overrides layered on top of the category defaults.
/// Built once from configuration and shared across a run.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    overrides: HashMap<(u64, ErrorCategory), RetryPolicy>,
}

impl PolicyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_override(&mut self, chain_id: u64, category: ErrorCategory, policy: RetryPolicy) {
        self.overrides.insert((chain_id, category), policy);
    }

    #[must_use]
    pub fn resolve(&self, chain_id: u64, category: ErrorCategory) -> RetryPolicy {
        self.overrides
            .get(&(chain_id, category))
            .copied()
            .unwrap_or_else(|| default_policy_for(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_is_never_retried_by_default() {
        let table = PolicyTable::new();
        assert_eq!(table.resolve(1, ErrorCategory::Revert).max_retries, 0);
    }

    #[test]
    fn network_override_wins_over_category_default() {
        let mut table = PolicyTable::new();
        table.set_override(8_453, ErrorCategory::Timeout, RetryPolicy::new(10, 100));
        let resolved = table.resolve(8_453, ErrorCategory::Timeout);
        assert_eq!(resolved.max_retries, 10);
        assert_eq!(resolved.base_delay_ms, 100);
    }

    #[test]
    fn unrelated_chain_falls_back_to_default() {
        let mut table = PolicyTable::new();
        table.set_override(8_453, ErrorCategory::Timeout, RetryPolicy::new(10, 100));
        let resolved = table.resolve(1, ErrorCategory::Timeout);
        assert_eq!(resolved, default_policy_for(ErrorCategory::Timeout));
    }
}
