use std::str::FromStr;
use std::time::Instant;

use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_rpc_types_eth::TransactionRequest;
use chrono::Utc;
use orchestrator_types::{ContractType, ErrorCategory, TestType, Wei};

use crate::context::NetworkTaskContext;
use crate::error::{OpError, RunnerError};
use crate::phase::PhaseOutcome;
use crate::phases::{build_result, configuration_error_result};
use crate::state;

/// Name the deployment phase registers the EVM compatibility contract
/// under; see `ContractType::Evm` in `phases::deployment::expected_contracts`.
const ASSEMBLY_OPS_CONTRACT: &str = "AssemblyOps";

/// One precompile/assembly-operation sub-test: a fixed address and
/// calldata that every EVM-compatible chain is expected to answer.
struct PrecompileOp {
    name: &'static str,
    address: &'static str,
    calldata: &'static [u8],
}

const PRECOMPILE_OPS: &[PrecompileOp] = &[
    PrecompileOp {
        name: "ecrecover",
        address: "0x0000000000000000000000000000000000000001",
        // hash || v || r || s, a standard ecrecover test vector.
        calldata: &[
            0x45, 0x6e, 0x9a, 0xea, 0x5e, 0x19, 0x7a, 0x1f, 0x1a, 0xf7, 0xa3, 0xe8, 0x5e, 0x32, 0x12, 0xfa,
            0x40, 0x49, 0xa3, 0xba, 0x34, 0xc2, 0x28, 0x9b, 0x4c, 0x86, 0x0f, 0xc0, 0xb0, 0xc6, 0x4e, 0xf3,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1c,
            0x92, 0x42, 0x68, 0x5b, 0xf1, 0x61, 0x79, 0x3c, 0xc2, 0x56, 0x03, 0xc2, 0x31, 0xbc, 0x2f, 0x56,
            0x8e, 0xb6, 0x30, 0xea, 0x16, 0xaa, 0x13, 0x7d, 0x26, 0x64, 0xac, 0x80, 0x38, 0x82, 0x5a, 0x2,
            0x06, 0x44, 0xe5, 0x14, 0x54, 0x8d, 0x04, 0xe6, 0xfb, 0x35, 0x8c, 0xd1, 0x3f, 0x0d, 0x5a, 0x0c,
            0x0d, 0x5a, 0x02, 0xdf, 0x78, 0xf0, 0x1a, 0x4f, 0x28, 0x62, 0xbb, 0x6c, 0xf4, 0x74, 0xd8, 0xbb,
        ],
    },
    PrecompileOp {
        name: "sha256",
        address: "0x0000000000000000000000000000000000000002",
        calldata: b"orchestrator precompile probe",
    },
    PrecompileOp {
        name: "ripemd160",
        address: "0x0000000000000000000000000000000000000003",
        calldata: b"orchestrator precompile probe",
    },
    PrecompileOp {
        name: "identity",
        address: "0x0000000000000000000000000000000000000004",
        calldata: b"orchestrator precompile probe",
    },
];

/// One assembly-operation sub-test against the deployed `AssemblyOps`
/// contract: a Solidity-style signature used to derive the 4-byte
/// selector, and how many `uint256` words of fixed probe data to append.
struct AssemblyOp {
    name: &'static str,
    signature: &'static str,
    arg_count: usize,
}

const ASSEMBLY_OPS: &[AssemblyOp] = &[
    AssemblyOp { name: "asm_add", signature: "add(uint256,uint256)", arg_count: 2 },
    AssemblyOp { name: "asm_sstore", signature: "store(uint256)", arg_count: 1 },
    AssemblyOp { name: "asm_sload", signature: "load()", arg_count: 0 },
    AssemblyOp { name: "asm_mstore", signature: "scratch(uint256)", arg_count: 1 },
];

/// Loads the active `AssemblyOps` deployment from the Contract Registry;
/// a network with nothing registered under `ContractType::Evm` fails the
/// whole phase with a single configuration-error result rather than
/// silently skipping straight to the precompile table. Runs the
/// precompile table, the assembly-operation calls against the deployed
/// contract, then one self-transfer transaction that exercises the
/// signer's explicit-nonce path. Each sub-test gets its own send/receipt
/// timeout budget from the network's configured `Timeouts`.
pub async fn run(ctx: &NetworkTaskContext) -> Result<PhaseOutcome, RunnerError> {
    let started = Instant::now();

    let deployment = ctx
        .runner
        .contracts
        .get_active(ctx.spec.chain_id, ContractType::Evm, ASSEMBLY_OPS_CONTRACT)
        .await?;
    let Some(deployment) = deployment else {
        let result = configuration_error_result(
            ctx,
            TestType::Evm,
            "evm_setup",
            &OpError::configuration(format!("{ASSEMBLY_OPS_CONTRACT} is not deployed on this network")),
        );
        return Ok(PhaseOutcome::from_results(TestType::Evm, started.elapsed(), vec![result]));
    };
    let contract_address =
        Address::from_str(&deployment.address).map_err(|error| OpError::configuration(error.to_string()))?;

    let mut results = Vec::new();
    let provider = ctx.runner.pool.get_provider(&ctx.spec).await?;

    for op in PRECOMPILE_OPS {
        let start = Utc::now();
        let outcome = run_precompile(ctx, &provider, op).await;
        results.push(match outcome {
            Ok(()) => build_result(
                ctx,
                TestType::Evm,
                op.name,
                start,
                true,
                Wei::ZERO,
                Wei::ZERO,
                None,
                None,
                None,
                serde_json::json!({ "address": op.address }),
            ),
            Err(error) => build_result(
                ctx,
                TestType::Evm,
                op.name,
                start,
                false,
                Wei::ZERO,
                Wei::ZERO,
                None,
                None,
                Some(&error),
                serde_json::json!({ "address": op.address }),
            ),
        });
    }

    if let Some(private_key) = ctx.runner.private_key.as_deref() {
        let signer = ctx.runner.pool.get_signer(&ctx.spec, 0, private_key).await?;

        for op in ASSEMBLY_OPS {
            let start = Utc::now();
            let outcome = run_assembly_op(ctx, &provider, &signer, contract_address, op).await;
            results.push(match outcome {
                Ok((tx_hash, block_number, gas_used, replaced)) => build_result(
                    ctx,
                    TestType::Evm,
                    op.name,
                    start,
                    true,
                    gas_used,
                    Wei::ZERO,
                    Some(tx_hash),
                    Some(block_number),
                    None,
                    serde_json::json!({ "replaced": replaced }),
                ),
                Err(error) => build_result(
                    ctx,
                    TestType::Evm,
                    op.name,
                    start,
                    false,
                    Wei::ZERO,
                    Wei::ZERO,
                    None,
                    None,
                    Some(&error),
                    serde_json::json!({}),
                ),
            });
        }

        let start = Utc::now();
        match run_self_transfer(ctx, &provider, &signer).await {
            Ok((tx_hash, block_number, gas_used, replaced)) => results.push(build_result(
                ctx,
                TestType::Evm,
                "self_transfer",
                start,
                true,
                gas_used,
                Wei::ZERO,
                Some(tx_hash),
                Some(block_number),
                None,
                serde_json::json!({ "replaced": replaced }),
            )),
            Err(error) => results.push(build_result(
                ctx,
                TestType::Evm,
                "self_transfer",
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
    Ok(PhaseOutcome::from_results(TestType::Evm, started.elapsed(), results))
}

async fn run_precompile(ctx: &NetworkTaskContext, provider: &orchestrator_resource_pool::ProviderHandle, op: &PrecompileOp) -> Result<(), OpError> {
    use alloy_provider::Provider;

    let address =
        Address::from_str(op.address).map_err(|error| OpError::configuration(format!("bad precompile address: {error}")))?;
    let calldata = Bytes::from_static(op.calldata);
    let request = TransactionRequest::default().to(address).input(calldata.into());

    let deadline = ctx.spec.timeouts.send();
    ctx.runner
        .retry
        .execute(ctx.spec.chain_id, None, Some(op.name.to_string()), || async {
            tokio::time::timeout(deadline, provider.call(request.clone()))
                .await
                .map_err(|_| OpError {
                    category: ErrorCategory::Timeout,
                    message: format!("{} timed out after {:?}", op.name, deadline),
                })?
                .map_err(OpError::from_display)
        })
        .await
        .map_err(crate::error::flatten_retry_error)?;
    Ok(())
}

fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn encode_assembly_call(op: &AssemblyOp) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32 * op.arg_count);
    data.extend_from_slice(&selector(op.signature));
    for slot in 0..op.arg_count {
        data.extend_from_slice(&U256::from(7u64 + slot as u64).to_be_bytes::<32>());
    }
    Bytes::from(data)
}

async fn run_assembly_op(
    ctx: &NetworkTaskContext,
    provider: &orchestrator_resource_pool::ProviderHandle,
    signer: &orchestrator_resource_pool::SharedSigner,
    contract_address: Address,
    op: &AssemblyOp,
) -> Result<(String, u64, Wei, bool), OpError> {
    let nonce = signer.next_nonce().await.map_err(OpError::from)?;
    let quote = ctx.runner.gas.quote(&ctx.spec, &*provider, None).await;

    let request = TransactionRequest::default()
        .to(contract_address)
        .from(signer.address())
        .nonce(nonce)
        .gas_price(quote.gas_price.as_u128())
        .input(encode_assembly_call(op).into());

    let send_deadline = ctx.spec.timeouts.send();
    let receipt_deadline = ctx.spec.timeouts.receipt();

    let result = ctx
        .runner
        .retry
        .execute(ctx.spec.chain_id, None, Some(op.name.to_string()), || async {
            state::submit_and_confirm(provider, signer.address(), nonce, request.clone(), send_deadline, receipt_deadline)
                .await?
                .into_result()
        })
        .await;

    signer.advance_nonce().await;
    result.map_err(crate::error::flatten_retry_error)
}

async fn run_self_transfer(
    ctx: &NetworkTaskContext,
    provider: &orchestrator_resource_pool::ProviderHandle,
    signer: &orchestrator_resource_pool::SharedSigner,
) -> Result<(String, u64, Wei, bool), OpError> {
    let nonce = signer.next_nonce().await.map_err(OpError::from)?;
    let address = signer.address();

    let quote = ctx.runner.gas.quote(&ctx.spec, &*provider, None).await;

    let request = TransactionRequest::default()
        .to(address)
        .from(address)
        .nonce(nonce)
        .value(U256::ZERO)
        .gas_price(quote.gas_price.as_u128());

    let send_deadline = ctx.spec.timeouts.send();
    let receipt_deadline = ctx.spec.timeouts.receipt();

    let outcome = state::submit_and_confirm(provider, address, nonce, request, send_deadline, receipt_deadline).await?;
    signer.advance_nonce().await;
    outcome.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precompile_table_has_distinct_names() {
        let mut names: Vec<&str> = PRECOMPILE_OPS.iter().map(|op| op.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PRECOMPILE_OPS.len());
    }

    #[test]
    fn assembly_ops_have_distinct_names() {
        let mut names: Vec<&str> = ASSEMBLY_OPS.iter().map(|op| op.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ASSEMBLY_OPS.len());
    }

    #[test]
    fn encode_assembly_call_sizes_calldata_to_arg_count() {
        let op = AssemblyOp { name: "t", signature: "add(uint256,uint256)", arg_count: 2 };
        assert_eq!(encode_assembly_call(&op).len(), 4 + 32 * 2);
    }
}
