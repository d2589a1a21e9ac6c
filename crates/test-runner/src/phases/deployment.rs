use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use chrono::Utc;
use orchestrator_types::{ContractDeployment, ContractType, ErrorCategory, HealthStatus, Wei};

use crate::artifacts;
use crate::context::NetworkTaskContext;
use crate::error::{OpError, RunnerError};

/// Contracts expected to exist for a given `ContractType`, in deployment
/// order.
fn expected_contracts(contract_type: ContractType) -> &'static [&'static str] {
    match contract_type {
        ContractType::Defi => &[
            "TokenA", "TokenB", "RewardToken", "DEX", "LendingProtocol", "YieldFarm", "NFTCollection", "MultiSigWallet",
        ],
        ContractType::Load => &["SimpleStorage"],
        ContractType::Evm => &["AssemblyOps"],
        ContractType::Unknown => &[],
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeploymentSummary {
    pub deployed: Vec<ContractDeployment>,
    pub failed: Vec<(String, OpError)>,
    pub total_gas_used: u128,
    pub total_cost_native: u128,
}

/// Deploys every contract in `expected_contracts(contractType)` that is
/// not already active on this chain, recording each one in the Contract
/// Registry. Already-active rows are left untouched.
pub async fn run(ctx: &NetworkTaskContext, contract_type: ContractType) -> Result<DeploymentSummary, RunnerError> {
    let expected = expected_contracts(contract_type);
    let active = ctx
        .runner
        .contracts
        .get_active_by_type(ctx.spec.chain_id, contract_type)
        .await?;
    let active_names: std::collections::HashSet<&str> = active.iter().map(|d| d.name.as_str()).collect();

    let Some(private_key) = ctx.runner.private_key.as_deref() else {
        return Err(RunnerError::NoSigner);
    };
    let provider = ctx.runner.pool.get_provider(&ctx.spec).await?;
    let signer = ctx.runner.pool.get_signer(&ctx.spec, 0, private_key).await?;

    let mut summary = DeploymentSummary::default();

    for name in expected.iter().filter(|name| !active_names.contains(*name)) {
        match deploy_one(ctx, &provider, &signer, contract_type, name).await {
            Ok(deployment) => {
                summary.total_gas_used += deployment.gas_used.as_u128();
                summary.total_cost_native += deployment.total_cost().as_u128();
                let saved = ctx.runner.contracts.save(deployment).await?;
                summary.deployed.push(saved);
            }
            Err(error) => summary.failed.push(((*name).to_string(), error)),
        }
    }

    ctx.runner.pool.release(&provider).await;
    Ok(summary)
}

async fn deploy_one(
    ctx: &NetworkTaskContext,
    provider: &orchestrator_resource_pool::ProviderHandle,
    signer: &orchestrator_resource_pool::SharedSigner,
    contract_type: ContractType,
    name: &str,
) -> Result<ContractDeployment, OpError> {
    let artifact = artifacts::resolve(&ctx.runner.artifact_dir, name, None)?;
    let bytecode_bytes =
        hex_decode(&artifact.bytecode).map_err(|error| OpError::configuration(format!("{name}: {error}")))?;
    let bytecode_hash = format!("{:x}", alloy_primitives::keccak256(&bytecode_bytes));

    let nonce = signer.next_nonce().await.map_err(OpError::from)?;
    let quote = ctx.runner.gas.quote(&ctx.spec, &*provider, None).await;

    let request = TransactionRequest::default()
        .from(signer.address())
        .nonce(nonce)
        .gas_price(quote.gas_price.as_u128())
        .input(alloy_primitives::Bytes::from(bytecode_bytes).into());

    let send_deadline = ctx.spec.timeouts.deployment();
    let pending = tokio::time::timeout(send_deadline, provider.send_transaction(request))
        .await
        .map_err(|_| OpError {
            category: ErrorCategory::Timeout,
            message: format!("{name} deployment send timed out"),
        })?
        .map_err(OpError::from_display)?;

    signer.advance_nonce().await;

    let receipt = tokio::time::timeout(ctx.spec.timeouts.confirmation(), pending.get_receipt())
        .await
        .map_err(|_| OpError {
            category: ErrorCategory::Timeout,
            message: format!("{name} deployment receipt timed out"),
        })?
        .map_err(OpError::from_display)?;

    if !receipt.status() {
        return Err(OpError {
            category: ErrorCategory::Revert,
            message: format!("{name} deployment reverted"),
        });
    }

    let address = receipt.contract_address.ok_or_else(|| OpError::configuration(format!("{name}: no contract address in receipt")))?;

    Ok(ContractDeployment {
        deployment_id: orchestrator_types::DeploymentId::new(),
        network_id: ctx.spec.id.clone(),
        chain_id: ctx.spec.chain_id,
        name: name.to_string(),
        contract_type,
        address: format!("{address:#x}"),
        tx_hash: format!("{:#x}", receipt.transaction_hash),
        block_number: receipt.block_number.unwrap_or_default(),
        gas_used: Wei::from(receipt.gas_used),
        gas_price: quote.gas_price,
        deployed_at: Utc::now(),
        deployer: format!("{:#x}", signer.address()),
        constructor_args: serde_json::json!([]),
        abi: artifact.abi,
        bytecode_hash,
        version: 1,
        active: true,
        verified: false,
        health_status: HealthStatus::Healthy,
        last_health_check: None,
        metadata: serde_json::json!({}),
    })
}

fn hex_decode(value: &str) -> Result<Vec<u8>, String> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    (0..trimmed.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&trimmed[i..i + 2], 16).map_err(|error| error.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defi_set_has_eight_contracts() {
        assert_eq!(expected_contracts(ContractType::Defi).len(), 8);
    }

    #[test]
    fn hex_decode_roundtrips_a_simple_value() {
        assert_eq!(hex_decode("0x6001").unwrap(), vec![0x60, 0x01]);
    }
}
