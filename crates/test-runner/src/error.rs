use orchestrator_types::ErrorCategory;
use thiserror::Error;

use orchestrator_retry::{classify_message, Classify};

/// Adapter-layer error: every fallible call the phases make (RPC, pool,
/// registry, store) is converted into this at the boundary so the Retry
/// Manager matches on a structured category instead of substring-sniffing
/// a fresh error type per dependency.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OpError {
    pub category: ErrorCategory,
    pub message: String,
}

impl OpError {
    #[must_use]
    pub fn from_display(value: impl std::fmt::Display) -> Self {
        let message = value.to_string();
        Self {
            category: classify_message(&message),
            message,
        }
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Unknown,
            message: message.into(),
        }
    }
}

impl Classify for OpError {
    fn category(&self) -> ErrorCategory {
        self.category
    }
}

impl From<orchestrator_resource_pool::PoolError> for OpError {
    fn from(error: orchestrator_resource_pool::PoolError) -> Self {
        Self::from_display(error)
    }
}

impl From<orchestrator_contract_registry::RegistryError> for OpError {
    fn from(error: orchestrator_contract_registry::RegistryError) -> Self {
        Self::from_display(error)
    }
}

impl From<orchestrator_result_store::StoreError> for OpError {
    fn from(error: orchestrator_result_store::StoreError) -> Self {
        Self::from_display(error)
    }
}

/// Flattens a retry-exhausted or breaker-open result down to the single
/// `OpError` a phase persists as a failed `TestResult`.
#[must_use]
pub fn flatten_retry_error(error: orchestrator_retry::RetryError<OpError>) -> OpError {
    match error {
        orchestrator_retry::RetryError::Exhausted { source, .. } => source,
        orchestrator_retry::RetryError::BreakerOpen { retry_after_ms } => OpError {
            category: ErrorCategory::Connection,
            message: format!("circuit breaker open, retry after {retry_after_ms}ms"),
        },
    }
}

/// Top-level error surfaced by the Runner for failures that abort a whole
/// network (not an individual phase, which degrades to a failed
/// `TestResult` instead of propagating).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Store(#[from] orchestrator_result_store::StoreError),

    #[error(transparent)]
    Pool(#[from] orchestrator_resource_pool::PoolError),

    #[error(transparent)]
    Registry(#[from] orchestrator_contract_registry::RegistryError),

    #[error("network {0} is not known to the registry")]
    UnknownNetwork(String),

    #[error("no private key configured; transaction-sending phases cannot run")]
    NoSigner,
}
