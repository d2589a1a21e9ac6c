use orchestrator_result_store::{MetricFilter, Store};
use orchestrator_types::PerformanceMetric;

use crate::error::AnalyticsError;

pub async fn record_metric(store: &Store, metric: PerformanceMetric) -> Result<(), AnalyticsError> {
    store.insert_performance_metric(metric).await?;
    Ok(())
}

pub async fn record_metrics(store: &Store, metrics: Vec<PerformanceMetric>) -> Result<(), AnalyticsError> {
    store.insert_performance_metrics(metrics).await?;
    Ok(())
}

/// `(timestamp, value)` pairs for `name`, ordered ascending, matching the
/// filter's `network_id`/`run_id`/`since` fields.
pub async fn get_time_series(store: &Store, name: &str, filter: MetricFilter) -> Result<Vec<(chrono::DateTime<chrono::Utc>, f64)>, AnalyticsError> {
    let filter = MetricFilter {
        name: Some(name.to_string()),
        ..filter
    };
    let metrics = store.get_performance_metrics(filter).await?;
    Ok(metrics.into_iter().map(|m| (m.timestamp, m.value)).collect())
}
