use std::time::Instant;

use alloy_primitives::U256;
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use chrono::Utc;
use orchestrator_types::{ErrorCategory, TestType, Wei};

use crate::context::NetworkTaskContext;
use crate::error::{OpError, RunnerError};
use crate::phase::PhaseOutcome;
use crate::phases::build_result;

const FINALITY_PROBE_COUNT: usize = 3;
const FINALITY_POLL_INTERVAL_MS: u64 = 500;

/// Sends `FINALITY_PROBE_COUNT` self-transfers and measures, for each,
/// the wall-clock time from submission to the block reaching
/// `NetworkSpec::finality_blocks` confirmations past the one it landed
/// in: submission → confirmation → N-block-finality latency.
pub async fn run(ctx: &NetworkTaskContext) -> Result<PhaseOutcome, RunnerError> {
    let started = Instant::now();
    let mut results = Vec::new();

    let Some(private_key) = ctx.runner.private_key.as_deref() else {
        return Err(RunnerError::NoSigner);
    };
    let provider = ctx.runner.pool.get_provider(&ctx.spec).await?;
    let signer = ctx.runner.pool.get_signer(&ctx.spec, 0, private_key).await?;

    for index in 0..FINALITY_PROBE_COUNT {
        let start = Utc::now();
        let test_name = format!("finality_{index}");
        match measure_one(ctx, &provider, &signer).await {
            Ok((tx_hash, block_number, gas_used, confirmation_ms, finality_ms)) => results.push(build_result(
                ctx,
                TestType::Finality,
                &test_name,
                start,
                true,
                gas_used,
                Wei::ZERO,
                Some(tx_hash),
                Some(block_number),
                None,
                serde_json::json!({
                    "confirmation_ms": confirmation_ms,
                    "finality_ms": finality_ms,
                    "finality_blocks": ctx.spec.finality_blocks,
                }),
            )),
            Err(error) => results.push(build_result(
                ctx,
                TestType::Finality,
                &test_name,
                start,
                false,
                Wei::ZERO,
                Wei::ZERO,
                None,
                None,
                Some(&error),
                serde_json::json!({}),
            )),
        }
    }

    ctx.runner.pool.release(&provider).await;
    Ok(PhaseOutcome::from_results(TestType::Finality, started.elapsed(), results))
}

async fn measure_one(
    ctx: &NetworkTaskContext,
    provider: &orchestrator_resource_pool::ProviderHandle,
    signer: &orchestrator_resource_pool::SharedSigner,
) -> Result<(String, u64, Wei, u64, u64), OpError> {
    let submitted_at = Instant::now();

    let nonce = signer.next_nonce().await.map_err(OpError::from)?;
    let address = signer.address();
    let quote = ctx.runner.gas.quote(&ctx.spec, &*provider, None).await;
    let request = TransactionRequest::default()
        .to(address)
        .from(address)
        .nonce(nonce)
        .value(U256::ZERO)
        .gas_price(quote.gas_price.as_u128());

    let pending = tokio::time::timeout(ctx.spec.timeouts.send(), provider.send_transaction(request))
        .await
        .map_err(|_| OpError {
            category: ErrorCategory::Timeout,
            message: "finality probe send timed out".into(),
        })?
        .map_err(OpError::from_display)?;

    signer.advance_nonce().await;

    let receipt = tokio::time::timeout(ctx.spec.timeouts.receipt(), pending.get_receipt())
        .await
        .map_err(|_| OpError {
            category: ErrorCategory::Timeout,
            message: "finality probe receipt timed out".into(),
        })?
        .map_err(OpError::from_display)?;

    if !receipt.status() {
        return Err(OpError {
            category: ErrorCategory::Revert,
            message: "finality probe reverted".into(),
        });
    }

    let confirmation_ms = submitted_at.elapsed().as_millis() as u64;
    let inclusion_block = receipt.block_number.unwrap_or_default();
    let finality_target = inclusion_block + ctx.spec.finality_blocks;

    wait_for_block(provider, finality_target, ctx.spec.timeouts.confirmation()).await?;
    let finality_ms = submitted_at.elapsed().as_millis() as u64;

    Ok((
        format!("{:#x}", receipt.transaction_hash),
        inclusion_block,
        Wei::from(receipt.gas_used),
        confirmation_ms,
        finality_ms,
    ))
}

async fn wait_for_block(
    provider: &orchestrator_resource_pool::ProviderHandle,
    target: u64,
    deadline: std::time::Duration,
) -> Result<(), OpError> {
    tokio::time::timeout(deadline, async {
        loop {
            match provider.get_block_number().await {
                Ok(current) if current >= target => return Ok(()),
                Ok(_) => tokio::time::sleep(std::time::Duration::from_millis(FINALITY_POLL_INTERVAL_MS)).await,
                Err(error) => return Err(OpError::from_display(error)),
            }
        }
    })
    .await
    .map_err(|_| OpError {
        category: ErrorCategory::Timeout,
        message: format!("block {target} was not reached before the finality deadline"),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_count_and_poll_interval_are_positive() {
        assert!(FINALITY_PROBE_COUNT > 0);
        assert!(FINALITY_POLL_INTERVAL_MS > 0);
    }
}
