pub mod defi;
pub mod deployment;
pub mod evm;
pub mod finality;
pub mod load;

use chrono::Utc;
use orchestrator_types::{ErrorCategory, TestResult, TestType, Wei};

use crate::context::NetworkTaskContext;
use crate::error::OpError;

/// Shared helper for building a `TestResult` row from a sub-test's
/// outcome; every phase funnels through this so the persisted shape is
/// identical regardless of which phase produced it.
#[allow(clippy::too_many_arguments)]
pub fn build_result(
    ctx: &NetworkTaskContext,
    test_type: TestType,
    test_name: &str,
    start: chrono::DateTime<Utc>,
    success: bool,
    gas_used: Wei,
    gas_price: Wei,
    tx_hash: Option<String>,
    block_number: Option<u64>,
    error: Option<&OpError>,
    metadata: serde_json::Value,
) -> TestResult {
    let end = Utc::now();
    let cost_native = Wei(gas_used.as_u128().saturating_mul(gas_price.as_u128()));
    TestResult {
        run_id: ctx.run_id,
        network_id: ctx.spec.id.clone(),
        test_type,
        test_name: test_name.to_string(),
        success,
        start,
        end,
        duration_ms: (end - start).num_milliseconds().max(0) as u64,
        gas_used,
        gas_price,
        tx_hash,
        block_number,
        error_message: error.map(|e| e.message.clone()),
        error_category: error.map(|e| e.category),
        cost_native,
        cost_usd_cents: 0,
        metadata,
    }
}

pub fn configuration_error_result(ctx: &NetworkTaskContext, test_type: TestType, test_name: &str, error: &OpError) -> TestResult {
    build_result(
        ctx,
        test_type,
        test_name,
        Utc::now(),
        false,
        Wei::ZERO,
        Wei::ZERO,
        None,
        None,
        Some(&OpError {
            category: ErrorCategory::Unknown,
            message: error.message.clone(),
        }),
        serde_json::json!({}),
    )
}
