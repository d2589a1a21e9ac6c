use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ids::RunId, run::TestType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub run_id: RunId,
    pub network_id: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub test_type: Option<TestType>,
    pub extra: serde_json::Value,
}
