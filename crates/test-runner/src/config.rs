use std::time::Duration;

use orchestrator_types::{ContractType, RunMode, TestType};

/// Top-level run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub networks: Vec<String>,
    pub tests: Vec<TestType>,
    pub mode: RunMode,
    pub parallel: bool,
    pub max_concurrent: usize,
    pub timeout: Duration,
    pub verbose: bool,
    pub retry_until_success: bool,
    pub contract_type: Option<ContractType>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            networks: Vec::new(),
            tests: vec![TestType::Evm],
            mode: RunMode::Standard,
            parallel: false,
            max_concurrent: 4,
            timeout: Duration::from_secs(120),
            verbose: false,
            retry_until_success: false,
            contract_type: None,
        }
    }
}

/// Bound on outer attempts for `retryUntilSuccess`: at most 10 outer
/// attempts before giving up on a phase.
pub const MAX_RETRY_UNTIL_SUCCESS_ATTEMPTS: u32 = 10;

/// Grace window the Runner waits for in-flight operations to finish after
/// a cancellation signal before forcing cleanup.
pub const CANCELLATION_GRACE: Duration = Duration::from_secs(10);
