use std::sync::Arc;

use orchestrator_event_bus::OrchestratorEvent;
use orchestrator_result_store::NewTestRun;
use orchestrator_types::{NetworkResult, NetworkSpec, RunId, RunMode, Totals};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::{RunConfig, CANCELLATION_GRACE};
use crate::context::{NetworkTaskContext, RunnerContext};
use crate::error::RunnerError;
use crate::network_task;

/// Final rollup of one `Runner::run` call, mirroring what gets persisted
/// and published on the event bus.
pub struct RunOutcome {
    pub run_id: RunId,
    pub totals: Totals,
    pub network_results: Vec<NetworkResult>,
}

/// Top-level Test Runner. Owns nothing the phases don't already get
/// through [`RunnerContext`]; its job is dispatch (parallel vs.
/// sequential), persistence of the run header, and cancellation.
pub struct Runner {
    context: Arc<RunnerContext>,
}

impl Runner {
    #[must_use]
    pub fn new(context: RunnerContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Runs `config` against every network it names, persisting the
    /// `TestRun` header first and the final totals/event last. A
    /// network's own RPC/pool failure is recorded as a failed
    /// `NetworkResult` rather than aborting the others.
    pub async fn run(&self, config: RunConfig) -> Result<RunOutcome, RunnerError> {
        let run_id = RunId::new();
        let specs: Vec<_> = config
            .networks
            .iter()
            .map(|id| {
                self.context
                    .registry
                    .get(id)
                    .ok_or_else(|| RunnerError::UnknownNetwork(id.clone()))
            })
            .collect::<Result<_, _>>()?;

        if config.mode == RunMode::Deployment {
            return self.run_deployment_mode(run_id, config, specs).await;
        }

        self.context
            .store
            .insert_test_run(NewTestRun {
                run_id,
                mode: config.mode,
                parallel: config.parallel,
                network_ids: config.networks.clone(),
                test_types: config.tests.clone(),
                raw_config: raw_config_json(&config),
            })
            .await?;

        self.context.events.publish(OrchestratorEvent::TestRunStarted {
            run_id: run_id.to_string(),
            mode: config.mode,
            networks: config.networks.clone(),
            test_types: config.tests.clone(),
        });

        let network_results = if config.parallel {
            self.run_parallel(run_id, &config, specs).await
        } else {
            self.run_sequential(run_id, &config, specs).await
        };

        self.finish(run_id, network_results).await
    }

    async fn run_parallel(
        &self,
        run_id: RunId,
        config: &RunConfig,
        specs: Vec<Arc<NetworkSpec>>,
    ) -> Vec<NetworkResult> {
        let mut tasks = JoinSet::new();
        for spec in specs {
            self.context.events.publish(OrchestratorEvent::NetworkStarted {
                run_id: run_id.to_string(),
                network_id: spec.id.clone(),
            });
            let ctx = NetworkTaskContext {
                runner: Arc::clone(&self.context),
                run_id,
                spec,
                config: config.clone(),
            };
            tasks.spawn(network_task::run(ctx));
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    self.persist_network_outcome(&outcome).await;
                    results.push(outcome.result);
                }
                Err(join_error) => warn!(%join_error, "network task panicked"),
            }
        }
        results
    }

    /// `outcome.error` is only set when a network aborts before any phase
    /// runs (no usable provider/signer for that network at all, as opposed
    /// to an individual phase failing). That is treated as critical: in
    /// sequential mode the remaining networks are skipped rather than run
    /// against a pool that just failed to hand out a connection, instead of
    /// silently attempting every other network anyway.
    async fn run_sequential(
        &self,
        run_id: RunId,
        config: &RunConfig,
        specs: Vec<Arc<NetworkSpec>>,
    ) -> Vec<NetworkResult> {
        let mut results = Vec::new();
        let total = specs.len();
        for (index, spec) in specs.into_iter().enumerate() {
            let network_id = spec.id.clone();
            self.context.events.publish(OrchestratorEvent::NetworkStarted {
                run_id: run_id.to_string(),
                network_id: network_id.clone(),
            });
            let ctx = NetworkTaskContext {
                runner: Arc::clone(&self.context),
                run_id,
                spec,
                config: config.clone(),
            };
            let outcome = network_task::run(ctx).await;
            let critical = outcome.error.is_some();
            self.persist_network_outcome(&outcome).await;
            results.push(outcome.result);
            if critical {
                let skipped = total - index - 1;
                warn!(network = %network_id, skipped, "sequential run stopping after a critical network failure");
                break;
            }
        }
        results
    }

    async fn persist_network_outcome(&self, outcome: &network_task::NetworkOutcome) {
        for result in &outcome.test_results {
            if let Err(error) = self.context.store.insert_test_result(result.clone()).await {
                warn!(%error, test_name = %result.test_name, "failed to persist test result");
            }
        }
        if let Err(error) = self.context.store.insert_network_result(outcome.result.clone()).await {
            warn!(%error, network_id = %outcome.result.network_id, "failed to persist network result");
        }
    }

    async fn finish(&self, run_id: RunId, network_results: Vec<NetworkResult>) -> Result<RunOutcome, RunnerError> {
        let mut totals = Totals::default();
        let per_network: Vec<(String, Totals)> = network_results
            .iter()
            .map(|result| {
                totals.tests += result.totals.tests;
                totals.successes += result.totals.successes;
                totals.failures += result.totals.failures;
                totals.gas_used += result.totals.gas_used;
                totals.cost_native += result.totals.cost_native;
                totals.cost_usd_cents += result.totals.cost_usd_cents;
                (result.network_id.clone(), result.totals)
            })
            .collect();

        self.context.store.update_test_run(run_id, chrono::Utc::now(), totals).await?;
        self.context.events.publish(OrchestratorEvent::TestCompleted {
            run_id: run_id.to_string(),
            totals,
            per_network,
        });

        info!(run_id = %run_id, tests = totals.tests, successes = totals.successes, "run finished");
        Ok(RunOutcome {
            run_id,
            totals,
            network_results,
        })
    }

    async fn run_deployment_mode(
        &self,
        run_id: RunId,
        config: RunConfig,
        specs: Vec<Arc<NetworkSpec>>,
    ) -> Result<RunOutcome, RunnerError> {
        self.context
            .store
            .insert_test_run(NewTestRun {
                run_id,
                mode: config.mode,
                parallel: config.parallel,
                network_ids: config.networks.clone(),
                test_types: Vec::new(),
                raw_config: raw_config_json(&config),
            })
            .await?;

        let mut network_results = Vec::new();
        for spec in specs {
            let chain_id = spec.chain_id;
            let ctx = NetworkTaskContext {
                runner: Arc::clone(&self.context),
                run_id,
                spec,
                config: config.clone(),
            };
            let summary = network_task::run_deployment(&ctx).await?;
            let mut totals = Totals::default();
            totals.tests = summary.deployed.len() as u64 + summary.failed.len() as u64;
            totals.successes = summary.deployed.len() as u64;
            totals.failures = summary.failed.len() as u64;
            totals.gas_used = summary.total_gas_used;
            totals.cost_native = summary.total_cost_native;

            let result = NetworkResult {
                run_id,
                network_id: ctx.spec.id.clone(),
                chain_id,
                totals,
                success: summary.failed.is_empty(),
                block_number_start: summary.deployed.first().map(|d| d.block_number),
                block_number_end: summary.deployed.last().map(|d| d.block_number),
                average_gas_price: summary.deployed.last().map(|d| d.gas_price),
            };
            self.context.store.insert_network_result(result.clone()).await?;
            network_results.push(result);
        }

        self.finish(run_id, network_results).await
    }

    /// Stops accepting new phases, waits up to [`CANCELLATION_GRACE`] for
    /// whatever is in flight, then releases every pooled resource.
    pub async fn cancel(&self) {
        info!("cancellation requested, waiting for in-flight operations");
        tokio::time::sleep(CANCELLATION_GRACE).await;
        self.context.pool.cleanup().await;
        if let Err(error) = self.context.store.close().await {
            warn!(%error, "store close failed during cancellation");
        }
    }
}

fn raw_config_json(config: &RunConfig) -> serde_json::Value {
    serde_json::json!({
        "networks": config.networks,
        "tests": config.tests,
        "mode": config.mode,
        "parallel": config.parallel,
        "maxConcurrent": config.max_concurrent,
        "timeoutSecs": config.timeout.as_secs(),
        "verbose": config.verbose,
        "retryUntilSuccess": config.retry_until_success,
        "contractType": config.contract_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_config_json_round_trips_the_network_list() {
        let config = RunConfig {
            networks: vec!["sepolia".into()],
            ..Default::default()
        };
        let value = raw_config_json(&config);
        assert_eq!(value["networks"][0], "sepolia");
    }
}
