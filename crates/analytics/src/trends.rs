use crate::stats::{linear_regression, percentage_change};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendClassification {
    Stable,
    Increasing,
    StronglyIncreasing,
    Decreasing,
    StronglyDecreasing,
    InsufficientData,
}

#[derive(Debug, Clone, Copy)]
pub struct TrendAnalysis {
    pub slope: f64,
    pub r2: f64,
    pub percentage_change: f64,
    pub classification: TrendClassification,
}

const MIN_POINTS: usize = 4;
const STRONG_CHANGE_PCT: f64 = 20.0;
const MILD_CHANGE_PCT: f64 = 5.0;

/// Linear regression over `(timestamp_seconds, value)`, classifying the
/// trend by comparing the mean of the most recent half of the series
/// ("recent window") to the mean of the earlier half ("baseline
/// window").
#[must_use]
pub fn analyze_trends(points: &[(f64, f64)]) -> TrendAnalysis {
    if points.len() < MIN_POINTS {
        return TrendAnalysis {
            slope: 0.0,
            r2: 0.0,
            percentage_change: 0.0,
            classification: TrendClassification::InsufficientData,
        };
    }

    let (slope, r2) = linear_regression(points);
    let mid = points.len() / 2;
    let baseline_mean = mean(&points[..mid]);
    let recent_mean = mean(&points[mid..]);
    let change = percentage_change(baseline_mean, recent_mean);

    let classification = if change >= STRONG_CHANGE_PCT {
        TrendClassification::StronglyIncreasing
    } else if change >= MILD_CHANGE_PCT {
        TrendClassification::Increasing
    } else if change <= -STRONG_CHANGE_PCT {
        TrendClassification::StronglyDecreasing
    } else if change <= -MILD_CHANGE_PCT {
        TrendClassification::Decreasing
    } else {
        TrendClassification::Stable
    };

    TrendAnalysis {
        slope,
        r2,
        percentage_change: change,
        classification,
    }
}

fn mean(points: &[(f64, f64)]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|(_, y)| y).sum::<f64>() / points.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_min_points_is_insufficient_data() {
        let result = analyze_trends(&[(0.0, 1.0), (1.0, 2.0)]);
        assert_eq!(result.classification, TrendClassification::InsufficientData);
    }

    #[test]
    fn stable_series_classifies_as_stable() {
        let points: Vec<(f64, f64)> = (0..20).map(|i| (f64::from(i), 100.0)).collect();
        let result = analyze_trends(&points);
        assert_eq!(result.classification, TrendClassification::Stable);
    }

    #[test]
    fn gas_used_drift_classifies_as_strongly_increasing() {
        let mut points = Vec::new();
        for i in 0..25 {
            points.push((f64::from(i), 100_000.0));
        }
        for i in 25..50 {
            points.push((f64::from(i), 125_000.0));
        }
        let result = analyze_trends(&points);
        assert_eq!(result.classification, TrendClassification::StronglyIncreasing);
        assert!((result.percentage_change - 25.0).abs() < 1.0);
    }
}
