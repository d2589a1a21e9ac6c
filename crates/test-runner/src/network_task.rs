use std::time::Instant;

use orchestrator_types::{ErrorCategory, NetworkResult, TestResult, TestType, Totals, Wei};
use tracing::{info, warn};

use crate::config::MAX_RETRY_UNTIL_SUCCESS_ATTEMPTS;
use crate::context::NetworkTaskContext;
use crate::error::OpError;
use crate::phase::PhaseOutcome;
use crate::phases::{configuration_error_result, defi, deployment, evm, finality, load};

/// `tests` is filtered against this list (rather than iterated in
/// caller-supplied order) so the phase queue always executes in the
/// same sequence regardless of how the caller wrote the config.
const PHASE_ORDER: &[TestType] = &[TestType::Evm, TestType::Defi, TestType::Load, TestType::Finality];

/// Outcome of running the full phase queue for one network. `error` is
/// set only when a whole network aborted before producing any results
/// (e.g. no usable RPC endpoint); individual phase failures still show
/// up as failed `TestResult`s and a `success = false` `NetworkResult`.
pub struct NetworkOutcome {
    pub result: NetworkResult,
    pub test_results: Vec<TestResult>,
    pub error: Option<String>,
}

/// Runs every phase in `ctx.config.tests` for one network, applying the
/// whole-phase retry budget from `RetryManager::policy` and, if
/// `retryUntilSuccess` is set, rerunning only the sub-tests that failed.
pub async fn run(ctx: NetworkTaskContext) -> NetworkOutcome {
    let chain_id = ctx.spec.chain_id;
    let network_id = ctx.spec.id.clone();

    match ctx.runner.pool.get_provider(&ctx.spec).await {
        Ok(provider) => ctx.runner.pool.release(&provider).await,
        Err(error) => {
            warn!(network = %network_id, %error, "network task aborted before any phase ran");
            return NetworkOutcome {
                result: empty_network_result(&ctx, chain_id),
                test_results: Vec::new(),
                error: Some(error.to_string()),
            };
        }
    }

    let mut totals = Totals::default();
    let mut test_results = Vec::new();
    let mut all_phases_succeeded = true;

    for &test_type in PHASE_ORDER {
        if !ctx.config.tests.contains(&test_type) {
            continue;
        }

        let mut outcome = run_phase_with_retry(&ctx, test_type).await;

        if ctx.config.retry_until_success && !outcome.success {
            outcome = retry_until_success(&ctx, test_type, outcome).await;
        }

        all_phases_succeeded &= outcome.success;
        for result in &outcome.results {
            totals.add_result(result);
        }
        test_results.extend(outcome.results);
    }

    let average_gas_price = if test_results.is_empty() {
        None
    } else {
        let sum: u128 = test_results.iter().map(|r| r.gas_price.as_u128()).sum();
        Some(Wei(sum / test_results.len() as u128))
    };

    let result = NetworkResult {
        run_id: ctx.run_id,
        network_id: network_id.clone(),
        chain_id,
        totals,
        success: all_phases_succeeded,
        block_number_start: test_results.iter().find_map(|r| r.block_number),
        block_number_end: test_results.iter().rev().find_map(|r| r.block_number),
        average_gas_price,
    };

    info!(network = %network_id, success = result.success, tests = result.totals.tests, "network phase queue finished");

    NetworkOutcome {
        result,
        test_results,
        error: None,
    }
}

/// Runs `test_type` once, retrying the *whole phase* up to the resolved
/// policy's `max_retries` while its success rate stays below the
/// phase's floor. Always returns the last attempt's outcome, even if
/// every retry was exhausted.
async fn run_phase_with_retry(ctx: &NetworkTaskContext, test_type: TestType) -> PhaseOutcome {
    let max_retries = ctx.runner.retry.policy(ctx.spec.chain_id, ErrorCategory::Unknown).max_retries;

    let mut attempt = 0;
    loop {
        let outcome = dispatch(ctx, test_type).await;
        if outcome.success || attempt >= max_retries {
            return outcome;
        }
        attempt += 1;
        warn!(
            network = %ctx.spec.id,
            phase = ?test_type,
            attempt,
            success_rate = outcome.success_rate,
            "phase below floor, retrying whole phase"
        );
    }
}

/// `retryUntilSuccess`: rerun only the sub-tests that failed in the
/// last attempt, bounded at [`MAX_RETRY_UNTIL_SUCCESS_ATTEMPTS`] outer
/// attempts.
async fn retry_until_success(ctx: &NetworkTaskContext, test_type: TestType, mut outcome: PhaseOutcome) -> PhaseOutcome {
    let mut attempts = 0;
    while !outcome.success && attempts < MAX_RETRY_UNTIL_SUCCESS_ATTEMPTS {
        let failing_before = outcome.failing_test_names();
        if failing_before.is_empty() {
            break;
        }
        attempts += 1;

        let rerun = dispatch(ctx, test_type).await;
        let kept: Vec<TestResult> = outcome
            .results
            .into_iter()
            .filter(|result| !failing_before.contains(&result.test_name))
            .collect();
        let merged: Vec<TestResult> = kept.into_iter().chain(rerun.results).collect();

        outcome = PhaseOutcome::from_results(test_type, rerun.duration, merged);
        info!(
            network = %ctx.spec.id,
            phase = ?test_type,
            attempt = attempts,
            success_rate = outcome.success_rate,
            "retryUntilSuccess attempt"
        );
    }
    outcome
}

async fn dispatch(ctx: &NetworkTaskContext, test_type: TestType) -> PhaseOutcome {
    let started = Instant::now();
    let outcome = match test_type {
        TestType::Evm => evm::run(ctx).await,
        TestType::Defi => defi::run(ctx).await,
        TestType::Load => load::run(ctx).await,
        TestType::Finality => finality::run(ctx).await,
    };

    outcome.unwrap_or_else(|error| {
        let op_error = OpError::configuration(error.to_string());
        let result = configuration_error_result(ctx, test_type, &format!("{test_type:?}_setup").to_lowercase(), &op_error);
        PhaseOutcome::from_results(test_type, started.elapsed(), vec![result])
    })
}

/// Runs a deployment-mode task, which is not part of [`PHASE_ORDER`]:
/// it bypasses the per-test-type floor accounting entirely and finalizes
/// its own totals from `ContractDeployment` costs.
pub async fn run_deployment(ctx: &NetworkTaskContext) -> Result<deployment::DeploymentSummary, crate::error::RunnerError> {
    let contract_type = ctx.config.contract_type.unwrap_or(orchestrator_types::ContractType::Defi);
    deployment::run(ctx, contract_type).await
}

fn empty_network_result(ctx: &NetworkTaskContext, chain_id: u64) -> NetworkResult {
    NetworkResult {
        run_id: ctx.run_id,
        network_id: ctx.spec.id.clone(),
        chain_id,
        totals: Totals::default(),
        success: false,
        block_number_start: None,
        block_number_end: None,
        average_gas_price: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_order_is_evm_defi_load_finality() {
        assert_eq!(PHASE_ORDER, &[TestType::Evm, TestType::Defi, TestType::Load, TestType::Finality]);
    }
}
