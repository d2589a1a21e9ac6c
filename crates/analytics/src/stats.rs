/// Least-squares fit of `value` against `timestamp` (as seconds since the
/// first point, to keep the numbers well-scaled). Returns `(slope, r2)`;
/// both are `0.0` when fewer than two points are given.
#[must_use]
pub fn linear_regression(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    if points.len() < 2 {
        return (0.0, 0.0);
    }

    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for &(x, y) in points {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
    }
    if var_x == 0.0 {
        return (0.0, 0.0);
    }
    let slope = cov / var_x;
    let intercept = mean_y - slope * mean_x;

    let mut ss_tot = 0.0;
    let mut ss_res = 0.0;
    for &(x, y) in points {
        let predicted = slope * x + intercept;
        ss_res += (y - predicted).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }
    let r2 = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };
    (slope, r2)
}

/// Percentage change of `after` relative to `before`. `0.0` when `before`
/// is `0.0`, to avoid a divide-by-zero producing `inf`/`NaN` findings.
#[must_use]
pub fn percentage_change(before: f64, after: f64) -> f64 {
    if before == 0.0 {
        return 0.0;
    }
    (after - before) / before * 100.0
}

/// Tukey fences: `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`. Values outside the
/// fences returned as outliers, in their original order.
#[must_use]
pub fn detect_outliers(values: &[f64]) -> Vec<f64> {
    if values.len() < 4 {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;

    values.iter().copied().filter(|v| *v < lower || *v > upper).collect()
}

fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let idx = fraction * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = idx - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_line_has_r2_of_one() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (f64::from(i), f64::from(i) * 2.0 + 1.0)).collect();
        let (slope, r2) = linear_regression(&points);
        assert!((slope - 2.0).abs() < 1e-9);
        assert!((r2 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_points_is_flat() {
        assert_eq!(linear_regression(&[(0.0, 1.0)]), (0.0, 0.0));
        assert_eq!(linear_regression(&[]), (0.0, 0.0));
    }

    #[test]
    fn percentage_change_handles_zero_baseline() {
        assert_eq!(percentage_change(0.0, 10.0), 0.0);
        assert!((percentage_change(100.0, 125.0) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn detects_a_single_high_outlier() {
        let values = vec![1.0, 2.0, 2.0, 3.0, 2.0, 1.0, 100.0];
        let outliers = detect_outliers(&values);
        assert_eq!(outliers, vec![100.0]);
    }

    #[test]
    fn too_few_points_never_flags_outliers() {
        assert!(detect_outliers(&[1.0, 2.0, 3.0]).is_empty());
    }
}
