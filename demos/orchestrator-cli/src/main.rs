use std::env;
use std::time::Duration;

use anyhow::{Context as _, Result};
use orchestrator_core::{bootstrap, logging, OrchestratorEnv};
use orchestrator_types::{RunMode, TestType};
use tracing::{info, warn};

const DEFAULT_TEST_TYPES: &[TestType] = &[TestType::Evm, TestType::Defi, TestType::Load, TestType::Finality];

/// Thin wiring demo: loads network specs from `ORCHESTRATOR_NETWORK_DIR`,
/// builds the Runner and friends via [`orchestrator_core::bootstrap`],
/// and drives one standard parallel run across every loaded network.
#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let settings = OrchestratorEnv::load();
    info!(
        network_dir = %settings.network_spec_dir.display(),
        store_path = %settings.store_path.display(),
        "starting orchestrator demo"
    );

    let orchestrator = bootstrap(&settings).await.context("bootstrap failed")?;
    let networks: Vec<String> = orchestrator.registry.all().iter().map(|spec| spec.id.clone()).collect();
    info!(networks = networks.len(), "loaded network specs");

    let config = orchestrator_test_runner::RunConfig {
        networks,
        tests: DEFAULT_TEST_TYPES.to_vec(),
        mode: RunMode::Standard,
        parallel: true,
        max_concurrent: read_env_usize("ORCHESTRATOR_MAX_CONCURRENT", 4),
        timeout: Duration::from_secs(read_env_u64("ORCHESTRATOR_RUN_TIMEOUT_SECS", 300)),
        verbose: env::var("ORCHESTRATOR_VERBOSE").is_ok(),
        retry_until_success: env::var("ORCHESTRATOR_RETRY_UNTIL_SUCCESS").is_ok(),
        contract_type: None,
    };

    let run = orchestrator.runner.run(config);
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => {
            let outcome = result.context("test run failed")?;
            info!(
                run_id = %outcome.run_id,
                tests = outcome.totals.tests,
                successes = outcome.totals.successes,
                failures = outcome.totals.failures,
                "run complete"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("SIGINT received, cancelling in-flight work");
            orchestrator.runner.cancel().await;
        }
    }

    Ok(())
}

fn read_env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn read_env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
