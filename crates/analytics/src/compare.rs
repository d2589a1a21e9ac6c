use orchestrator_result_store::{MetricFilter, Store};

use crate::error::AnalyticsError;

/// Metrics where a lower value is the better outcome. Every metric not
/// listed here is treated as higher-is-better.
const LOWER_IS_BETTER: &[&str] = &["response_time", "gas_used", "block_time", "error_rate"];

#[derive(Debug, Clone)]
pub struct NetworkMetricSummary {
    pub network_id: String,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub sample_count: usize,
    /// 0.0-1.0 score relative to the best-performing network in the group,
    /// where 1.0 is best.
    pub relative_score: f64,
}

/// Per-network summary of `metric_name` across all known networks, each
/// scored relative to the best performer in the group.
pub async fn compare_networks(
    store: &Store,
    metric_name: &str,
    network_ids: &[String],
) -> Result<Vec<NetworkMetricSummary>, AnalyticsError> {
    let mut raw = Vec::new();
    for network_id in network_ids {
        let filter = MetricFilter {
            network_id: Some(network_id.clone()),
            name: Some(metric_name.to_string()),
            ..Default::default()
        };
        let metrics = store.get_performance_metrics(filter).await?;
        if metrics.is_empty() {
            continue;
        }
        let values: Vec<f64> = metrics.iter().map(|m| m.value).collect();
        let sum: f64 = values.iter().sum();
        let avg = sum / values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        raw.push((network_id.clone(), avg, min, max, values.len()));
    }

    let lower_is_better = LOWER_IS_BETTER.contains(&metric_name);
    let best = if lower_is_better {
        raw.iter().map(|(_, avg, ..)| *avg).fold(f64::INFINITY, f64::min)
    } else {
        raw.iter().map(|(_, avg, ..)| *avg).fold(f64::NEG_INFINITY, f64::max)
    };

    Ok(raw
        .into_iter()
        .map(|(network_id, avg, min, max, sample_count)| {
            let relative_score = if best == 0.0 {
                1.0
            } else if lower_is_better {
                (best / avg).min(1.0)
            } else {
                (avg / best).min(1.0)
            };
            NetworkMetricSummary {
                network_id,
                avg,
                min,
                max,
                sample_count,
                relative_score,
            }
        })
        .collect())
}
