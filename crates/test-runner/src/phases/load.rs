use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use chrono::Utc;
use orchestrator_types::{ContractType, ErrorCategory, RunMode, TestType, Wei};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::context::NetworkTaskContext;
use crate::error::{OpError, RunnerError};
use crate::phase::PhaseOutcome;
use crate::phases::{build_result, configuration_error_result};

const BURST_MULTIPLIER: usize = 5;
const RAMP_STEPS: &[usize] = &[2, 4, 6];
const MAX_TPS: u64 = 50;

/// Number of transactions to submit per ramp step. `Stress` mode widens
/// the burst across three steps so later steps approximate a higher TPS
/// target; every other mode fires a single fixed-size burst.
fn burst_plan(mode: RunMode, max_concurrent: usize) -> Vec<usize> {
    match mode {
        RunMode::Stress => RAMP_STEPS.iter().map(|multiplier| multiplier * max_concurrent).collect(),
        _ => vec![max_concurrent * BURST_MULTIPLIER],
    }
}

/// Pause between ramp steps, long enough for `max_concurrent` workers to
/// drain a step at no more than `MAX_TPS` before the next step starts.
fn ramp_interval(step_size: usize, max_concurrent: usize) -> Duration {
    let tps = (step_size as u64).min(MAX_TPS).max(1);
    Duration::from_secs_f64(max_concurrent as f64 / tps as f64)
}

pub async fn run(ctx: &NetworkTaskContext) -> Result<PhaseOutcome, RunnerError> {
    let started = Instant::now();

    let Some(private_key) = ctx.runner.private_key.as_deref() else {
        return Err(RunnerError::NoSigner);
    };

    let target = ctx
        .runner
        .contracts
        .get_active(ctx.spec.chain_id, ContractType::Load, "SimpleStorage")
        .await?;
    let Some(deployment) = target else {
        let result = configuration_error_result(
            ctx,
            TestType::Load,
            "load_setup",
            &OpError::configuration("SimpleStorage is not deployed on this network"),
        );
        return Ok(PhaseOutcome::from_results(TestType::Load, started.elapsed(), vec![result]));
    };
    let address = Address::from_str(&deployment.address).map_err(|error| OpError::configuration(error.to_string()))?;

    let provider = ctx.runner.pool.get_provider(&ctx.spec).await?;
    let signer = ctx.runner.pool.get_signer(&ctx.spec, 0, private_key).await?;
    let start_nonce = signer.next_nonce().await.map_err(OpError::from)?;
    let quote = ctx.runner.gas.quote(&ctx.spec, &*provider, None).await;

    let plan = burst_plan(ctx.config.mode, ctx.config.max_concurrent.max(1));
    let mut results = Vec::new();
    let mut offset: u64 = 0;

    for (step_index, &size) in plan.iter().enumerate() {
        let semaphore = Arc::new(Semaphore::new(ctx.config.max_concurrent.max(1)));
        let mut joins = JoinSet::new();

        for slot in 0..size {
            let nonce = start_nonce + offset;
            offset += 1;
            let value = U256::from((step_index as u64) * 1_000_000 + slot as u64);
            let request = TransactionRequest::default()
                .to(address)
                .from(signer.address())
                .nonce(nonce)
                .gas_price(quote.gas_price.as_u128())
                .input(encode_store(value).into());

            let provider = provider.clone();
            let permit = Arc::clone(&semaphore).acquire_owned().await.expect("semaphore never closes");
            let send_deadline = ctx.spec.timeouts.send();
            let receipt_deadline = ctx.spec.timeouts.receipt();

            joins.spawn(async move {
                let _permit = permit;
                send_and_confirm(&provider, request, send_deadline, receipt_deadline).await
            });
        }

        let mut step_results = Vec::with_capacity(size);
        while let Some(joined) = joins.join_next().await {
            let start = Utc::now();
            let outcome = joined.unwrap_or_else(|join_error| {
                Err(OpError::configuration(format!("load worker task failed: {join_error}")))
            });
            step_results.push(match outcome {
                Ok((tx_hash, block_number, gas_used)) => build_result(
                    ctx,
                    TestType::Load,
                    &format!("store_{step_index}"),
                    start,
                    true,
                    gas_used,
                    Wei::ZERO,
                    Some(tx_hash),
                    Some(block_number),
                    None,
                    serde_json::json!({ "step": step_index }),
                ),
                Err(error) => build_result(
                    ctx,
                    TestType::Load,
                    &format!("store_{step_index}"),
                    start,
                    false,
                    Wei::ZERO,
                    Wei::ZERO,
                    None,
                    None,
                    Some(&error),
                    serde_json::json!({ "step": step_index }),
                ),
            });
        }
        results.append(&mut step_results);

        if step_index + 1 < plan.len() {
            tokio::time::sleep(ramp_interval(size, ctx.config.max_concurrent.max(1))).await;
        }
    }

    signer.reset_nonce().await;
    ctx.runner.pool.release(&provider).await;
    Ok(PhaseOutcome::from_results(TestType::Load, started.elapsed(), results))
}

async fn send_and_confirm(
    provider: &orchestrator_resource_pool::ProviderHandle,
    request: TransactionRequest,
    send_deadline: Duration,
    receipt_deadline: Duration,
) -> Result<(String, u64, Wei), OpError> {
    let pending = tokio::time::timeout(send_deadline, provider.send_transaction(request))
        .await
        .map_err(|_| OpError {
            category: ErrorCategory::Timeout,
            message: "load tx send timed out".into(),
        })?
        .map_err(OpError::from_display)?;

    let receipt = tokio::time::timeout(receipt_deadline, pending.get_receipt())
        .await
        .map_err(|_| OpError {
            category: ErrorCategory::Timeout,
            message: "load tx receipt timed out".into(),
        })?
        .map_err(OpError::from_display)?;

    if !receipt.status() {
        return Err(OpError {
            category: ErrorCategory::Revert,
            message: "load tx reverted".into(),
        });
    }

    Ok((
        format!("{:#x}", receipt.transaction_hash),
        receipt.block_number.unwrap_or_default(),
        Wei::from(receipt.gas_used),
    ))
}

fn encode_store(value: U256) -> Bytes {
    let digest = keccak256(b"store(uint256)");
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&digest[..4]);
    data.extend_from_slice(&value.to_be_bytes::<32>());
    Bytes::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_mode_fires_a_single_burst() {
        let plan = burst_plan(RunMode::Standard, 4);
        assert_eq!(plan, vec![20]);
    }

    #[test]
    fn stress_mode_ramps_across_three_steps() {
        let plan = burst_plan(RunMode::Stress, 4);
        assert_eq!(plan, vec![8, 16, 24]);
    }

    #[test]
    fn ramp_interval_shrinks_as_step_size_grows() {
        let small = ramp_interval(2, 4);
        let large = ramp_interval(40, 4);
        assert!(large < small);
    }
}
