use orchestrator_result_store::{MetricFilter, Store};

use crate::error::AnalyticsError;
use crate::trends::analyze_trends;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// A regression is an increase past the threshold (e.g. response time).
    Increase,
    /// A regression is a decrease past the threshold (e.g. success rate).
    Decrease,
}

#[derive(Debug, Clone, Copy)]
pub struct RegressionThreshold {
    pub metric_name: &'static str,
    pub direction: Direction,
    pub threshold_pct: f64,
}

/// Directional defaults: the metric name and the percentage change, in the
/// bad direction, that counts as a regression at the `minor` severity edge.
pub const DEFAULT_THRESHOLDS: &[RegressionThreshold] = &[
    RegressionThreshold { metric_name: "success_rate", direction: Direction::Decrease, threshold_pct: 5.0 },
    RegressionThreshold { metric_name: "response_time", direction: Direction::Increase, threshold_pct: 20.0 },
    RegressionThreshold { metric_name: "gas_used", direction: Direction::Increase, threshold_pct: 15.0 },
    RegressionThreshold { metric_name: "tps", direction: Direction::Decrease, threshold_pct: 10.0 },
    RegressionThreshold { metric_name: "block_time", direction: Direction::Increase, threshold_pct: 25.0 },
];

const MIN_R2: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RegressionSeverity {
    Minor,
    Moderate,
    Severe,
}

#[derive(Debug, Clone)]
pub struct RegressionFinding {
    pub network_id: Option<String>,
    pub metric_name: String,
    pub severity: RegressionSeverity,
    pub percentage_change: f64,
    pub confidence: f64,
}

fn severity_for(magnitude_pct: f64, threshold_pct: f64) -> RegressionSeverity {
    let ratio = magnitude_pct / threshold_pct;
    if ratio >= 1.65 {
        RegressionSeverity::Severe
    } else if ratio >= 1.2 {
        RegressionSeverity::Moderate
    } else {
        RegressionSeverity::Minor
    }
}

/// Runs [`crate::trends::analyze_trends`] for every `(metric, network)`
/// pair named in `thresholds` and flags ones whose change crosses the
/// threshold in the regression direction with `r2 >= 0.3` confidence.
pub async fn detect_regressions(
    store: &Store,
    network_ids: &[String],
    thresholds: &[RegressionThreshold],
) -> Result<Vec<RegressionFinding>, AnalyticsError> {
    let mut findings = Vec::new();

    for threshold in thresholds {
        for network_id in network_ids {
            let filter = MetricFilter {
                network_id: Some(network_id.clone()),
                ..Default::default()
            };
            let series = crate::series::get_time_series(store, threshold.metric_name, filter).await?;
            if series.is_empty() {
                continue;
            }
            let epoch = series[0].0;
            let points: Vec<(f64, f64)> = series
                .iter()
                .map(|(ts, value)| ((*ts - epoch).num_seconds() as f64, *value))
                .collect();

            let trend = analyze_trends(&points);
            if trend.r2 < MIN_R2 {
                continue;
            }

            let regressed = match threshold.direction {
                Direction::Increase => trend.percentage_change >= threshold.threshold_pct,
                Direction::Decrease => trend.percentage_change <= -threshold.threshold_pct,
            };
            if !regressed {
                continue;
            }

            tracing::debug!(
                network_id = network_id.as_str(),
                metric = threshold.metric_name,
                change_pct = trend.percentage_change,
                r2 = trend.r2,
                "regression detected"
            );

            findings.push(RegressionFinding {
                network_id: Some(network_id.clone()),
                metric_name: threshold.metric_name.to_string(),
                severity: severity_for(trend.percentage_change.abs(), threshold.threshold_pct),
                percentage_change: trend.percentage_change,
                confidence: trend.r2,
            });
        }
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severe_at_triple_threshold() {
        assert_eq!(severity_for(60.0, 20.0), RegressionSeverity::Severe);
    }

    #[test]
    fn severe_at_a_quarter_change_against_a_fifteen_percent_threshold() {
        // gas_used regressing 25% against its 15% threshold is a 1.67x ratio.
        assert_eq!(severity_for(25.0, 15.0), RegressionSeverity::Severe);
    }

    #[test]
    fn moderate_below_the_severe_band() {
        assert_eq!(severity_for(25.0, 20.0), RegressionSeverity::Moderate);
    }

    #[test]
    fn minor_just_past_threshold() {
        assert_eq!(severity_for(21.0, 20.0), RegressionSeverity::Minor);
    }
}
