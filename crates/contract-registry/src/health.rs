use std::str::FromStr;
use std::time::Instant;

use alloy_primitives::Address;
use alloy_provider::Provider;
use chrono::Utc;
use orchestrator_resource_pool::ProviderHandle;
use orchestrator_types::{ContractDeployment, HealthCheck, HealthStatus};
use serde_json::json;
use tracing::warn;

use crate::error::RegistryError;

/// Outcome of one [`crate::registry::ContractRegistry::check_health`]
/// call, mirroring the `{healthy, responseTimeMs, checks[], error?}`
/// shape persisted for a deployment.
#[derive(Debug, Clone)]
pub struct HealthOutcome {
    pub healthy: bool,
    pub response_time_ms: u64,
    pub checks: Vec<String>,
    pub error: Option<String>,
}

/// Performs, in order: (1) fetch on-chain code, empty means failed; (2)
/// fetch the latest block to confirm network liveness; (3) if the ABI
/// exposes a zero-argument view function, invoke it. Bounded retry on the
/// code fetch is provided by the caller's Retry Manager; this function
/// makes a single attempt per step.
pub async fn check_health(
    deployment: &ContractDeployment,
    provider: &ProviderHandle,
) -> Result<HealthOutcome, RegistryError> {
    let started = Instant::now();
    let mut checks = Vec::new();

    let address = match Address::from_str(&deployment.address) {
        Ok(address) => address,
        Err(error) => {
            return Ok(HealthOutcome {
                healthy: false,
                response_time_ms: started.elapsed().as_millis() as u64,
                checks: vec!["address_parse".into()],
                error: Some(error.to_string()),
            });
        }
    };

    let code = provider.get_code_at(address).await;
    match code {
        Ok(bytecode) if !bytecode.is_empty() => checks.push("code_present".into()),
        Ok(_) => {
            return Ok(HealthOutcome {
                healthy: false,
                response_time_ms: started.elapsed().as_millis() as u64,
                checks,
                error: Some("no code at address".into()),
            });
        }
        Err(error) => {
            return Ok(HealthOutcome {
                healthy: false,
                response_time_ms: started.elapsed().as_millis() as u64,
                checks,
                error: Some(error.to_string()),
            });
        }
    }

    match provider.get_block_number().await {
        Ok(_) => checks.push("network_live".into()),
        Err(error) => {
            return Ok(HealthOutcome {
                healthy: false,
                response_time_ms: started.elapsed().as_millis() as u64,
                checks,
                error: Some(error.to_string()),
            });
        }
    }

    if let Some(selector) = find_zero_arg_view_selector(&deployment.abi) {
        match call_view(provider, address, &selector).await {
            Ok(()) => checks.push(format!("view_call:{selector}")),
            Err(error) => {
                warn!(deployment = %deployment.deployment_id, %error, "zero-arg view call failed during health check");
                return Ok(HealthOutcome {
                    healthy: false,
                    response_time_ms: started.elapsed().as_millis() as u64,
                    checks,
                    error: Some(error),
                });
            }
        }
    }

    Ok(HealthOutcome {
        healthy: true,
        response_time_ms: started.elapsed().as_millis() as u64,
        checks,
        error: None,
    })
}

fn find_zero_arg_view_selector(abi: &serde_json::Value) -> Option<String> {
    let entries = abi.as_array()?;
    entries.iter().find_map(|entry| {
        let kind = entry.get("type")?.as_str()?;
        let mutability = entry.get("stateMutability").and_then(serde_json::Value::as_str);
        let inputs_empty = entry
            .get("inputs")
            .and_then(serde_json::Value::as_array)
            .is_none_or(|inputs| inputs.is_empty());
        if kind == "function" && inputs_empty && matches!(mutability, Some("view") | Some("pure")) {
            entry.get("name").and_then(serde_json::Value::as_str).map(ToString::to_string)
        } else {
            None
        }
    })
}

async fn call_view(provider: &ProviderHandle, address: Address, function_name: &str) -> Result<(), String> {
    use alloy_primitives::keccak256;
    use alloy_rpc_types_eth::TransactionRequest;

    let selector = &keccak256(format!("{function_name}()").as_bytes())[..4];
    let request = TransactionRequest::default().to(address).input(selector.to_vec().into());
    provider
        .call(request)
        .await
        .map(|_| ())
        .map_err(|error| error.to_string())
}

pub fn to_health_check(deployment: &ContractDeployment, outcome: &HealthOutcome) -> HealthCheck {
    HealthCheck {
        deployment_id: deployment.deployment_id,
        check_time: Utc::now(),
        status: if outcome.healthy {
            HealthStatus::Healthy
        } else {
            HealthStatus::Failed
        },
        response_time_ms: outcome.response_time_ms,
        gas_price_at_check: deployment.gas_price,
        error_message: outcome.error.clone(),
        checks: json!(outcome.checks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_a_zero_arg_view_function() {
        let abi = json!([
            { "type": "function", "name": "transfer", "stateMutability": "nonpayable", "inputs": [{"name": "to"}] },
            { "type": "function", "name": "totalSupply", "stateMutability": "view", "inputs": [] },
        ]);
        assert_eq!(find_zero_arg_view_selector(&abi), Some("totalSupply".to_string()));
    }

    #[test]
    fn ignores_functions_that_take_arguments() {
        let abi = json!([
            { "type": "function", "name": "balanceOf", "stateMutability": "view", "inputs": [{"name": "who"}] },
        ]);
        assert_eq!(find_zero_arg_view_selector(&abi), None);
    }

    #[test]
    fn ignores_non_view_functions() {
        let abi = json!([
            { "type": "function", "name": "mint", "stateMutability": "nonpayable", "inputs": [] },
        ]);
        assert_eq!(find_zero_arg_view_selector(&abi), None);
    }
}
