use orchestrator_types::{PerformanceMetric, RunId};
use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::runs::resolve_internal_id;

pub fn insert_performance_metric(conn: &Connection, metric: &PerformanceMetric) -> Result<(), StoreError> {
    let internal_id = resolve_internal_id(conn, &metric.run_id)?;
    conn.execute(
        "INSERT INTO performance_metrics (run_internal_id, network_id, name, value, unit, timestamp, test_type, extra)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            internal_id,
            metric.network_id,
            metric.name,
            metric.value,
            metric.unit,
            metric.timestamp.to_rfc3339(),
            metric.test_type.map(|t| serde_json::to_string(&t)).transpose()?,
            metric.extra.to_string(),
        ],
    )?;
    Ok(())
}

pub fn insert_performance_metrics(conn: &Connection, metrics: &[PerformanceMetric]) -> Result<(), StoreError> {
    for metric in metrics {
        insert_performance_metric(conn, metric)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct MetricFilter {
    pub run_id: Option<RunId>,
    pub network_id: Option<String>,
    pub name: Option<String>,
    pub since: Option<chrono::DateTime<chrono::Utc>>,
}

pub fn get_performance_metrics(
    conn: &Connection,
    filter: &MetricFilter,
) -> Result<Vec<PerformanceMetric>, StoreError> {
    let sql = "SELECT pm.network_id, pm.name, pm.value, pm.unit, pm.timestamp, pm.test_type, pm.extra, tr.run_id
         FROM performance_metrics pm JOIN test_runs tr ON tr.internal_id = pm.run_internal_id
         WHERE (:network_id IS NULL OR pm.network_id = :network_id)
           AND (:name IS NULL OR pm.name = :name)
           AND (:since IS NULL OR pm.timestamp >= :since)
           AND (:run_id IS NULL OR tr.run_id = :run_id)
         ORDER BY pm.timestamp ASC";

    let mut stmt = conn.prepare(sql)?;
    let network_id = filter.network_id.clone();
    let name = filter.name.clone();
    let since = filter.since.map(|dt| dt.to_rfc3339());
    let run_id = filter.run_id.map(|id| id.to_string());

    let rows = stmt
        .query_map(
            rusqlite::named_params! {
                ":network_id": network_id,
                ":name": name,
                ":since": since,
                ":run_id": run_id,
            },
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(network_id, name, value, unit, timestamp, test_type_json, extra, run_id_text)| {
                Ok(PerformanceMetric {
                    run_id: run_id_text
                        .parse()
                        .map_err(|_| StoreError::UnknownRunId(run_id_text.clone()))?,
                    network_id,
                    name,
                    value,
                    unit,
                    timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
                        .map(|dt| dt.with_timezone(&chrono::Utc))
                        .map_err(|e| StoreError::Sqlite(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))?,
                    test_type: test_type_json.map(|j| serde_json::from_str(&j)).transpose()?,
                    extra: serde_json::from_str(&extra)?,
                })
            },
        )
        .collect()
}
