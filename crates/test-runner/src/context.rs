use std::path::PathBuf;
use std::sync::Arc;

use orchestrator_contract_registry::ContractRegistry;
use orchestrator_event_bus::EventBus;
use orchestrator_gas_strategy::GasStrategyManager;
use orchestrator_network_registry::NetworkRegistry;
use orchestrator_resource_pool::ResourcePool;
use orchestrator_result_store::Store;
use orchestrator_retry::RetryManager;
use orchestrator_types::{NetworkSpec, RunId};

use crate::config::RunConfig;

/// Every collaborator the Test Runner needs, injected explicitly rather
/// than reached for as a singleton.
pub struct RunnerContext {
    pub registry: Arc<NetworkRegistry>,
    pub pool: Arc<ResourcePool>,
    pub retry: Arc<RetryManager>,
    pub gas: Arc<GasStrategyManager>,
    pub contracts: Arc<ContractRegistry>,
    pub store: Store,
    pub events: EventBus,
    pub private_key: Option<String>,
    pub artifact_dir: PathBuf,
}

/// Per-network slice of the runner context, passed down into each phase.
pub struct NetworkTaskContext {
    pub runner: Arc<RunnerContext>,
    pub run_id: RunId,
    pub spec: Arc<NetworkSpec>,
    pub config: RunConfig,
}
