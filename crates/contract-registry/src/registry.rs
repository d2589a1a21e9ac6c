use chrono::Utc;
use orchestrator_resource_pool::ProviderHandle;
use orchestrator_result_store::{DeploymentStats, Store};
use orchestrator_types::{ContractDeployment, ContractType, DeploymentId, HealthStatus};

use crate::error::RegistryError;
use crate::health::{check_health, to_health_check, HealthOutcome};

/// Authoritative "what is deployed where" index, a thin typed layer over
/// the Result Store's `contract_deployments` / `contract_health_checks`
/// tables.
pub struct ContractRegistry {
    store: Store,
}

impl ContractRegistry {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Assigns a new deployment id, supersedes the previous active row for
    /// the same `(chainId, type, name)` if one exists, then inserts. The
    /// supersede-then-insert runs inside a single `Store` transaction so no
    /// reader ever observes a window with zero active rows for that key.
    pub async fn save(&self, mut deployment: ContractDeployment) -> Result<ContractDeployment, RegistryError> {
        deployment.deployment_id = DeploymentId::new();
        self.store.save_deployment_superseding(deployment.clone()).await?;
        Ok(deployment)
    }

    pub async fn get_active(
        &self,
        chain_id: u64,
        contract_type: ContractType,
        name: &str,
    ) -> Result<Option<ContractDeployment>, RegistryError> {
        Ok(self
            .store
            .get_active_deployment(chain_id, contract_type, name.to_string())
            .await?)
    }

    pub async fn get_active_by_type(
        &self,
        chain_id: u64,
        contract_type: ContractType,
    ) -> Result<Vec<ContractDeployment>, RegistryError> {
        Ok(self.store.get_active_deployments_by_type(chain_id, contract_type).await?)
    }

    pub async fn get_all_by_network(&self, network_id: &str) -> Result<Vec<ContractDeployment>, RegistryError> {
        Ok(self.store.get_all_deployments_by_network(network_id.to_string()).await?)
    }

    pub async fn get_abi(&self, deployment_id: &str) -> Result<serde_json::Value, RegistryError> {
        self.store
            .get_abi(deployment_id.to_string())
            .await?
            .ok_or_else(|| RegistryError::MissingAbi(deployment_id.to_string()))
    }

    pub async fn mark_inactive(&self, deployment_id: &str) -> Result<bool, RegistryError> {
        Ok(self.store.mark_inactive(deployment_id.to_string()).await?)
    }

    /// Runs [`check_health`], persists the resulting `HealthCheck` (a
    /// no-op if the deployment has since been deleted) and updates the
    /// deployment's `healthStatus`.
    pub async fn check_health(
        &self,
        deployment: &ContractDeployment,
        provider: &ProviderHandle,
    ) -> Result<HealthOutcome, RegistryError> {
        let outcome = check_health(deployment, provider).await?;
        let check = to_health_check(deployment, &outcome);
        self.store.insert_health_check(check).await?;
        self.store
            .update_deployment_health(
                deployment.deployment_id.to_string(),
                if outcome.healthy {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Failed
                },
                Utc::now(),
            )
            .await?;
        Ok(outcome)
    }

    /// Parallel per-contract `check_health`, aggregating `allHealthy`.
    pub async fn verify_batch(
        &self,
        contracts: &[(ContractDeployment, ProviderHandle)],
    ) -> Result<(bool, Vec<HealthOutcome>), RegistryError> {
        let mut outcomes = Vec::with_capacity(contracts.len());
        let futures = contracts
            .iter()
            .map(|(deployment, provider)| self.check_health(deployment, provider));
        for result in futures::future::join_all(futures).await {
            outcomes.push(result?);
        }
        let all_healthy = outcomes.iter().all(|outcome| outcome.healthy);
        Ok((all_healthy, outcomes))
    }

    pub async fn cleanup_old_health_checks(&self, older_than_days: u32) -> Result<u64, RegistryError> {
        Ok(self.store.cleanup_old_health_checks(older_than_days).await?)
    }

    pub async fn get_stats(&self) -> Result<DeploymentStats, RegistryError> {
        Ok(self.store.get_deployment_stats().await?)
    }
}
