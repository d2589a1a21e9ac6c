//! Analytics (component H): descriptive statistics, trend analysis and
//! regression/outlier detection over metrics held in the result store.

pub mod aggregate;
pub mod compare;
pub mod error;
pub mod regressions;
pub mod series;
pub mod stats;
pub mod trends;

use orchestrator_result_store::{MetricFilter, Store};
use orchestrator_types::PerformanceMetric;

pub use aggregate::{Bucket, BucketStats};
pub use compare::NetworkMetricSummary;
pub use error::AnalyticsError;
pub use regressions::{Direction, RegressionFinding, RegressionSeverity, RegressionThreshold, DEFAULT_THRESHOLDS};
pub use trends::{TrendAnalysis, TrendClassification};

/// Facade over the result store's performance metrics, used by the
/// monitoring and reporting paths of the orchestrator.
#[derive(Clone)]
pub struct Analytics {
    store: Store,
}

impl Analytics {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn record_metric(&self, metric: PerformanceMetric) -> Result<(), AnalyticsError> {
        series::record_metric(&self.store, metric).await
    }

    pub async fn record_metrics(&self, metrics: Vec<PerformanceMetric>) -> Result<(), AnalyticsError> {
        series::record_metrics(&self.store, metrics).await
    }

    pub async fn get_time_series(
        &self,
        name: &str,
        filter: MetricFilter,
    ) -> Result<Vec<(chrono::DateTime<chrono::Utc>, f64)>, AnalyticsError> {
        series::get_time_series(&self.store, name, filter).await
    }

    pub async fn get_aggregated(
        &self,
        name: &str,
        bucket: Bucket,
        filter: MetricFilter,
    ) -> Result<Vec<BucketStats>, AnalyticsError> {
        aggregate::get_aggregated(&self.store, name, bucket, filter).await
    }

    pub async fn analyze_trends(&self, name: &str, filter: MetricFilter) -> Result<TrendAnalysis, AnalyticsError> {
        let series = series::get_time_series(&self.store, name, filter).await?;
        if series.is_empty() {
            return Ok(TrendAnalysis {
                slope: 0.0,
                r2: 0.0,
                percentage_change: 0.0,
                classification: TrendClassification::InsufficientData,
            });
        }
        let epoch = series[0].0;
        let points: Vec<(f64, f64)> = series
            .iter()
            .map(|(ts, value)| ((*ts - epoch).num_seconds() as f64, *value))
            .collect();
        Ok(trends::analyze_trends(&points))
    }

    pub async fn detect_regressions(
        &self,
        network_ids: &[String],
        thresholds: &[RegressionThreshold],
    ) -> Result<Vec<RegressionFinding>, AnalyticsError> {
        regressions::detect_regressions(&self.store, network_ids, thresholds).await
    }

    pub async fn compare_networks(
        &self,
        metric_name: &str,
        network_ids: &[String],
    ) -> Result<Vec<NetworkMetricSummary>, AnalyticsError> {
        compare::compare_networks(&self.store, metric_name, network_ids).await
    }

    #[must_use]
    pub fn detect_outliers(values: &[f64]) -> Vec<f64> {
        stats::detect_outliers(values)
    }
}
