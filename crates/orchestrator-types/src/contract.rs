use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ids::DeploymentId, wei::Wei};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    Evm,
    Defi,
    Load,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDeployment {
    pub deployment_id: DeploymentId,
    pub network_id: String,
    pub chain_id: u64,
    pub name: String,
    pub contract_type: ContractType,
    pub address: String,
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: Wei,
    pub gas_price: Wei,
    pub deployed_at: DateTime<Utc>,
    pub deployer: String,
    pub constructor_args: serde_json::Value,
    pub abi: serde_json::Value,
    pub bytecode_hash: String,
    pub version: u32,
    pub active: bool,
    pub verified: bool,
    pub health_status: HealthStatus,
    pub last_health_check: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl ContractDeployment {
    /// Total native cost of the deployment transaction, used by deployment
    /// mode summaries.
    #[must_use]
    pub fn total_cost(&self) -> Wei {
        Wei(self.gas_used.as_u128().saturating_mul(self.gas_price.as_u128()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub deployment_id: DeploymentId,
    pub check_time: DateTime<Utc>,
    pub status: HealthStatus,
    pub response_time_ms: u64,
    pub gas_price_at_check: Wei,
    pub error_message: Option<String>,
    pub checks: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_cost_multiplies_gas_and_price() {
        let deployment = ContractDeployment {
            deployment_id: DeploymentId::new(),
            network_id: "sepolia".into(),
            chain_id: 11_155_111,
            name: "TokenA".into(),
            contract_type: ContractType::Defi,
            address: "0x0".into(),
            tx_hash: "0x1".into(),
            block_number: 1,
            gas_used: Wei(1_000),
            gas_price: Wei(10),
            deployed_at: Utc::now(),
            deployer: "0xdeployer".into(),
            constructor_args: serde_json::json!([]),
            abi: serde_json::json!([]),
            bytecode_hash: "hash".into(),
            version: 1,
            active: true,
            verified: false,
            health_status: HealthStatus::Healthy,
            last_health_check: None,
            metadata: serde_json::json!({}),
        };
        assert_eq!(deployment.total_cost(), Wei(10_000));
    }
}
