use orchestrator_types::{Alert, RunMode, TestType, Totals, Wei};
use serde::{Deserialize, Serialize};

/// The domain events published over the bus. Delivery is not ordered
/// across publishers; subscribers must tolerate duplicate delivery of
/// the same event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    TestRunStarted {
        run_id: String,
        mode: RunMode,
        networks: Vec<String>,
        test_types: Vec<TestType>,
    },
    NetworkStarted {
        run_id: String,
        network_id: String,
    },
    TestCompleted {
        run_id: String,
        totals: Totals,
        per_network: Vec<(String, Totals)>,
    },
    RegressionDetected {
        network_id: String,
        metric_name: String,
        severity: String,
        percentage_change: f64,
        confidence: f64,
    },
    AlertTriggered {
        alert: Alert,
    },
    NetworkStatusChanged {
        network_id: String,
        online: bool,
        block_number: u64,
        gas_price: Wei,
        response_time_ms: u64,
    },
}

impl OrchestratorEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TestRunStarted { .. } => "test_run_started",
            Self::NetworkStarted { .. } => "network_started",
            Self::TestCompleted { .. } => "test_completed",
            Self::RegressionDetected { .. } => "regression_detected",
            Self::AlertTriggered { .. } => "alert_triggered",
            Self::NetworkStatusChanged { .. } => "network_status_changed",
        }
    }
}
