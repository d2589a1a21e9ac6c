//! Cross-cutting bootstrap (component J): reads the process environment
//! once into [`OrchestratorEnv`], installs logging, and wires every other
//! component into a [`Runner`] and [`Analytics`] facade ready to drive a
//! test run.

pub mod env;
pub mod error;
pub mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use orchestrator_analytics::Analytics;
use orchestrator_contract_registry::ContractRegistry;
use orchestrator_event_bus::EventBus;
use orchestrator_gas_strategy::GasStrategyManager;
use orchestrator_network_registry::NetworkRegistry;
use orchestrator_resource_pool::ResourcePool;
use orchestrator_result_store::Store;
use orchestrator_retry::{PolicyTable, RetryManager};
use orchestrator_test_runner::{Runner, RunnerContext};

pub use error::BootstrapError;

/// Process configuration read once at startup, collecting the scattered
/// `env::var` accessors in [`crate::env`] into a single frozen struct.
#[derive(Debug, Clone)]
pub struct OrchestratorEnv {
    pub network_spec_dir: PathBuf,
    pub store_path: PathBuf,
    pub artifact_dir: PathBuf,
    pub private_key: Option<String>,
    pub event_bus_capacity: usize,
    pub breaker_failure_threshold: u32,
    pub breaker_recovery: Duration,
    pub pool_idle_window: Duration,
}

impl OrchestratorEnv {
    #[must_use]
    pub fn load() -> Self {
        Self {
            network_spec_dir: env::network_spec_dir(),
            store_path: env::store_path(),
            artifact_dir: env::artifact_dir(),
            private_key: env::private_key(),
            event_bus_capacity: env::event_bus_capacity(),
            breaker_failure_threshold: env::breaker_failure_threshold(),
            breaker_recovery: env::breaker_recovery(),
            pool_idle_window: env::pool_idle_window(),
        }
    }
}

/// Everything a caller needs after wiring: the Test Runner plus the
/// Analytics and Event Bus facades, kept separate from `RunnerContext`
/// since callers outside a run (e.g. a reporting CLI) only need those
/// two.
pub struct Orchestrator {
    pub runner: Runner,
    pub analytics: Analytics,
    pub events: EventBus,
    pub registry: Arc<NetworkRegistry>,
}

/// Builds every component from `settings` and returns them wired
/// together: the Network Registry, Result Store, Event Bus, Analytics,
/// Contract Registry, Resource Pool, Gas Strategy Manager and Retry
/// Manager all land inside one `RunnerContext`/`Runner` pair.
pub async fn bootstrap(settings: &OrchestratorEnv) -> Result<Orchestrator, BootstrapError> {
    let registry = NetworkRegistry::new(settings.network_spec_dir.clone());
    let loaded = registry
        .load_all()
        .map_err(|source| BootstrapError::NetworkRegistry {
            dir: settings.network_spec_dir.display().to_string(),
            source,
        })?;
    if loaded == 0 {
        return Err(BootstrapError::EmptyRegistry(
            settings.network_spec_dir.display().to_string(),
        ));
    }
    let registry = Arc::new(registry);

    let store = Store::open(&settings.store_path).map_err(|source| BootstrapError::Store {
        path: settings.store_path.display().to_string(),
        source,
    })?;

    let events = EventBus::new(settings.event_bus_capacity);
    let analytics = Analytics::new(store.clone());
    let contracts = Arc::new(ContractRegistry::new(store.clone()));
    let pool = Arc::new(ResourcePool::new(settings.pool_idle_window));
    let gas = Arc::new(GasStrategyManager::new());
    let retry = Arc::new(RetryManager::new(
        PolicyTable::new(),
        settings.breaker_failure_threshold,
        settings.breaker_recovery,
    ));

    let context = RunnerContext {
        registry: Arc::clone(&registry),
        pool,
        retry,
        gas,
        contracts,
        store,
        events: events.clone(),
        private_key: settings.private_key.clone(),
        artifact_dir: settings.artifact_dir.clone(),
    };

    Ok(Orchestrator {
        runner: Runner::new(context),
        analytics,
        events,
        registry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_rejects_an_empty_network_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = tempfile::NamedTempFile::new().unwrap();
        let settings = OrchestratorEnv {
            network_spec_dir: dir.path().to_path_buf(),
            store_path: store.path().to_path_buf(),
            artifact_dir: dir.path().join("artifacts"),
            private_key: None,
            event_bus_capacity: 16,
            breaker_failure_threshold: 5,
            breaker_recovery: Duration::from_secs(1),
            pool_idle_window: Duration::from_secs(60),
        };

        let result = bootstrap(&settings).await;
        assert!(matches!(result, Err(BootstrapError::EmptyRegistry(_))));
    }
}
