//! Result Store (component E): typed, append-oriented persistence over an
//! embedded SQLite file.

mod alerts;
mod conn;
mod contracts;
mod error;
mod maintenance;
mod metrics;
mod purge;
mod results;
mod runs;
mod schema;
mod status;

use std::path::Path;

use orchestrator_types::{
    Alert, ContractDeployment, ContractType, HealthCheck, HealthStatus, NetworkResult, NetworkStatus,
    PerformanceMetric, RunId, TestResult, Totals,
};

pub use alerts::AlertFilter;
pub use conn::Store;
pub use contracts::DeploymentStats;
pub use error::StoreError;
pub use maintenance::StoreStats;
pub use metrics::MetricFilter;
pub use runs::{NewTestRun, RunFilter};
pub use status::StatusFilter;

impl Store {
    pub async fn insert_test_run(&self, run: NewTestRun) -> Result<i64, StoreError> {
        self.with_conn(move |conn| runs::insert_test_run(conn, &run)).await
    }

    pub async fn update_test_run(
        &self,
        run_id: RunId,
        end_time: chrono::DateTime<chrono::Utc>,
        totals: Totals,
    ) -> Result<(), StoreError> {
        self.with_conn(move |conn| runs::update_test_run(conn, &run_id, end_time, &totals))
            .await
    }

    pub async fn get_test_runs(&self, filter: RunFilter) -> Result<Vec<orchestrator_types::TestRun>, StoreError> {
        self.with_conn(move |conn| runs::get_test_runs(conn, &filter)).await
    }

    pub async fn insert_network_result(&self, result: NetworkResult) -> Result<(), StoreError> {
        self.with_conn(move |conn| results::insert_network_result(conn, &result))
            .await
    }

    pub async fn get_network_results(&self, run_id: RunId) -> Result<Vec<NetworkResult>, StoreError> {
        self.with_conn(move |conn| results::get_network_results(conn, &run_id))
            .await
    }

    pub async fn insert_test_result(&self, result: TestResult) -> Result<(), StoreError> {
        self.with_conn(move |conn| results::insert_test_result(conn, &result))
            .await
    }

    pub async fn get_test_results(
        &self,
        run_id: RunId,
        network_id: Option<String>,
    ) -> Result<Vec<TestResult>, StoreError> {
        self.with_conn(move |conn| results::get_test_results(conn, &run_id, network_id.as_deref()))
            .await
    }

    pub async fn insert_performance_metric(&self, metric: PerformanceMetric) -> Result<(), StoreError> {
        self.with_conn(move |conn| metrics::insert_performance_metric(conn, &metric))
            .await
    }

    pub async fn insert_performance_metrics(&self, metrics_batch: Vec<PerformanceMetric>) -> Result<(), StoreError> {
        self.with_conn(move |conn| metrics::insert_performance_metrics(conn, &metrics_batch))
            .await
    }

    pub async fn get_performance_metrics(&self, filter: MetricFilter) -> Result<Vec<PerformanceMetric>, StoreError> {
        self.with_conn(move |conn| metrics::get_performance_metrics(conn, &filter))
            .await
    }

    pub async fn insert_network_status(&self, status: NetworkStatus) -> Result<(), StoreError> {
        self.with_conn(move |conn| status::insert_network_status(conn, &status))
            .await
    }

    pub async fn get_network_status(&self, filter: StatusFilter) -> Result<Vec<NetworkStatus>, StoreError> {
        self.with_conn(move |conn| status::get_network_status(conn, &filter))
            .await
    }

    pub async fn insert_alert(&self, alert: Alert) -> Result<i64, StoreError> {
        self.with_conn(move |conn| alerts::insert_alert(conn, &alert)).await
    }

    pub async fn resolve_alert(&self, id: i64) -> Result<bool, StoreError> {
        self.with_conn(move |conn| alerts::resolve_alert(conn, id)).await
    }

    pub async fn get_alerts(&self, filter: AlertFilter) -> Result<Vec<Alert>, StoreError> {
        self.with_conn(move |conn| alerts::get_alerts(conn, &filter)).await
    }

    pub async fn save_deployment(&self, deployment: ContractDeployment) -> Result<(), StoreError> {
        self.with_conn(move |conn| contracts::save_deployment(conn, &deployment))
            .await
    }

    /// Supersede-then-insert in one transaction; see
    /// [`contracts::save_superseding`].
    pub async fn save_deployment_superseding(&self, deployment: ContractDeployment) -> Result<(), StoreError> {
        self.with_conn(move |conn| contracts::save_superseding(conn, &deployment))
            .await
    }

    pub async fn mark_inactive(&self, deployment_id: String) -> Result<bool, StoreError> {
        self.with_conn(move |conn| contracts::mark_inactive(conn, &deployment_id))
            .await
    }

    pub async fn get_active_deployment(
        &self,
        chain_id: u64,
        contract_type: ContractType,
        name: String,
    ) -> Result<Option<ContractDeployment>, StoreError> {
        self.with_conn(move |conn| contracts::get_active(conn, chain_id, contract_type, &name))
            .await
    }

    pub async fn get_active_deployments_by_type(
        &self,
        chain_id: u64,
        contract_type: ContractType,
    ) -> Result<Vec<ContractDeployment>, StoreError> {
        self.with_conn(move |conn| contracts::get_active_by_type(conn, chain_id, contract_type))
            .await
    }

    pub async fn get_all_deployments_by_network(&self, network_id: String) -> Result<Vec<ContractDeployment>, StoreError> {
        self.with_conn(move |conn| contracts::get_all_by_network(conn, &network_id))
            .await
    }

    pub async fn get_abi(&self, deployment_id: String) -> Result<Option<serde_json::Value>, StoreError> {
        self.with_conn(move |conn| contracts::get_abi(conn, &deployment_id)).await
    }

    pub async fn update_deployment_health(
        &self,
        deployment_id: String,
        status: HealthStatus,
        checked_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StoreError> {
        self.with_conn(move |conn| contracts::update_health(conn, &deployment_id, status, checked_at))
            .await
    }

    pub async fn insert_health_check(&self, check: HealthCheck) -> Result<(), StoreError> {
        self.with_conn(move |conn| contracts::insert_health_check(conn, &check))
            .await
    }

    pub async fn cleanup_old_health_checks(&self, older_than_days: u32) -> Result<u64, StoreError> {
        self.with_conn(move |conn| contracts::cleanup_old_health_checks(conn, older_than_days))
            .await
    }

    pub async fn get_deployment_stats(&self) -> Result<DeploymentStats, StoreError> {
        self.with_conn(|conn| contracts::get_deployment_stats(conn)).await
    }

    pub async fn vacuum(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| maintenance::vacuum(conn)).await
    }

    pub async fn optimize(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| maintenance::optimize(conn)).await
    }

    /// Orderly shutdown hook for cancellation paths: runs a final
    /// optimize pass. The connection itself is reference-counted and
    /// closes when the last clone of this `Store` is dropped.
    pub async fn close(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| maintenance::close(conn)).await
    }

    pub async fn get_stats(&self) -> Result<StoreStats, StoreError> {
        self.with_conn(|conn| maintenance::get_stats(conn)).await
    }

    pub async fn backup(&self, destination: impl AsRef<Path> + Send + 'static) -> Result<(), StoreError> {
        self.with_conn(move |conn| maintenance::backup(conn, destination.as_ref()))
            .await
    }

    pub async fn purge_all(&self, confirm: bool) -> Result<(), StoreError> {
        self.with_conn(move |conn| purge::purge_all(conn, confirm)).await
    }

    pub async fn purge_older_than(&self, days: u32, confirm: bool) -> Result<u64, StoreError> {
        self.with_conn(move |conn| purge::purge_older_than(conn, days, confirm))
            .await
    }

    pub async fn purge_by_network(&self, network_id: String, confirm: bool) -> Result<u64, StoreError> {
        self.with_conn(move |conn| purge::purge_by_network(conn, &network_id, confirm))
            .await
    }
}
