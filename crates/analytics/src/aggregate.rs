use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use orchestrator_result_store::{MetricFilter, Store};

use crate::error::AnalyticsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy)]
pub struct BucketStats {
    pub bucket_start: DateTime<Utc>,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
}

/// Groups the time series for `name` into fixed-width buckets and computes
/// min/max/avg/sum/count per bucket, ordered ascending by bucket start.
pub async fn get_aggregated(
    store: &Store,
    name: &str,
    bucket: Bucket,
    filter: MetricFilter,
) -> Result<Vec<BucketStats>, AnalyticsError> {
    let filter = MetricFilter {
        name: Some(name.to_string()),
        ..filter
    };
    let metrics = store.get_performance_metrics(filter).await?;

    let mut groups: BTreeMap<DateTime<Utc>, Vec<f64>> = BTreeMap::new();
    for metric in metrics {
        let key = floor_to_bucket(metric.timestamp, bucket);
        groups.entry(key).or_default().push(metric.value);
    }

    Ok(groups
        .into_iter()
        .map(|(bucket_start, values)| {
            let count = values.len();
            let sum: f64 = values.iter().sum();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            BucketStats {
                bucket_start,
                count,
                min,
                max,
                avg: sum / count as f64,
                sum,
            }
        })
        .collect())
}

fn floor_to_bucket(ts: DateTime<Utc>, bucket: Bucket) -> DateTime<Utc> {
    match bucket {
        Bucket::Minute => ts
            .date_naive()
            .and_hms_opt(ts.hour(), ts.minute(), 0)
            .and_then(|naive| Utc.from_local_datetime(&naive).single())
            .unwrap_or(ts),
        Bucket::Hour => ts
            .date_naive()
            .and_hms_opt(ts.hour(), 0, 0)
            .and_then(|naive| Utc.from_local_datetime(&naive).single())
            .unwrap_or(ts),
        Bucket::Day => ts
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| Utc.from_local_datetime(&naive).single())
            .unwrap_or(ts),
        Bucket::Week => {
            let days_since_monday = i64::from(ts.weekday().num_days_from_monday());
            let day_start = ts
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .and_then(|naive| Utc.from_local_datetime(&naive).single())
                .unwrap_or(ts);
            day_start - Duration::days(days_since_monday)
        }
        Bucket::Month => Utc
            .with_ymd_and_hms(ts.year(), ts.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(ts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_bucket_truncates_minutes() {
        let ts = Utc.with_ymd_and_hms(2026, 7, 29, 14, 37, 12).unwrap();
        let bucketed = floor_to_bucket(ts, Bucket::Hour);
        assert_eq!(bucketed, Utc.with_ymd_and_hms(2026, 7, 29, 14, 0, 0).unwrap());
    }

    #[test]
    fn day_bucket_truncates_time_of_day() {
        let ts = Utc.with_ymd_and_hms(2026, 7, 29, 14, 37, 12).unwrap();
        let bucketed = floor_to_bucket(ts, Bucket::Day);
        assert_eq!(bucketed, Utc.with_ymd_and_hms(2026, 7, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn month_bucket_truncates_to_first_day() {
        let ts = Utc.with_ymd_and_hms(2026, 7, 29, 14, 37, 12).unwrap();
        let bucketed = floor_to_bucket(ts, Bucket::Month);
        assert_eq!(bucketed, Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap());
    }
}
