use chrono::Utc;
use orchestrator_types::{RunId, RunMode, TestType, Totals};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

pub struct NewTestRun {
    pub run_id: RunId,
    pub mode: RunMode,
    pub parallel: bool,
    pub network_ids: Vec<String>,
    pub test_types: Vec<TestType>,
    pub raw_config: serde_json::Value,
}

/// Looks up a run's autoincrement primary key from its external id, the
/// join point every other insert uses to attach to `test_runs`.
pub fn resolve_internal_id(conn: &Connection, run_id: &RunId) -> Result<i64, StoreError> {
    conn.query_row(
        "SELECT internal_id FROM test_runs WHERE run_id = ?1",
        params![run_id.to_string()],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| StoreError::UnknownRunId(run_id.to_string()))
}

pub fn insert_test_run(conn: &Connection, run: &NewTestRun) -> Result<i64, StoreError> {
    let now = Utc::now();
    let totals = Totals::default();
    conn.execute(
        "INSERT INTO test_runs
            (run_id, start_time, end_time, duration_ms, mode, parallel, networks, test_types, totals, config, created_at, updated_at)
         VALUES (?1, ?2, NULL, NULL, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            run.run_id.to_string(),
            now.to_rfc3339(),
            serde_json::to_string(&run.mode)?,
            run.parallel,
            serde_json::to_string(&run.network_ids)?,
            serde_json::to_string(&run.test_types)?,
            serde_json::to_string(&totals)?,
            run.raw_config.to_string(),
            now.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Marks a run finished and persists its final totals. Accepts the
/// already-accumulated [`Totals`] rather than recomputing them from
/// `test_results`, since the caller tracks totals incrementally as it
/// goes.
pub fn update_test_run(
    conn: &Connection,
    run_id: &RunId,
    end_time: chrono::DateTime<Utc>,
    totals: &Totals,
) -> Result<(), StoreError> {
    let internal_id = resolve_internal_id(conn, run_id)?;
    let start_time: String = conn.query_row(
        "SELECT start_time FROM test_runs WHERE internal_id = ?1",
        params![internal_id],
        |row| row.get(0),
    )?;
    let start = chrono::DateTime::parse_from_rfc3339(&start_time)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(end_time);
    let duration_ms = (end_time - start).num_milliseconds().max(0);

    conn.execute(
        "UPDATE test_runs SET end_time = ?1, duration_ms = ?2, totals = ?3, updated_at = ?4 WHERE internal_id = ?5",
        params![
            end_time.to_rfc3339(),
            duration_ms,
            serde_json::to_string(totals)?,
            Utc::now().to_rfc3339(),
            internal_id,
        ],
    )?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub since: Option<chrono::DateTime<Utc>>,
    pub mode: Option<RunMode>,
    pub network_id: Option<String>,
    pub limit: Option<u32>,
}

pub fn get_test_runs(conn: &Connection, filter: &RunFilter) -> Result<Vec<orchestrator_types::TestRun>, StoreError> {
    let mut sql = String::from(
        "SELECT internal_id, run_id, start_time, end_time, mode, parallel, networks, test_types, totals, config FROM test_runs WHERE 1=1",
    );
    if filter.since.is_some() {
        sql.push_str(" AND start_time >= ?1");
    }
    sql.push_str(" ORDER BY internal_id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let since_str = filter.since.map(|dt| dt.to_rfc3339());
    let rows: Vec<Result<orchestrator_types::TestRun, StoreError>> = if let Some(since) = &since_str {
        stmt.query_map(params![since], row_to_test_run)?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?
    } else {
        stmt.query_map([], row_to_test_run)?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?
    };
    let rows = rows.into_iter().collect::<Result<Vec<_>, StoreError>>()?;

    Ok(rows
        .into_iter()
        .filter(|run: &orchestrator_types::TestRun| {
            filter.mode.map_or(true, |mode| run.mode == mode)
                && filter
                    .network_id
                    .as_ref()
                    .map_or(true, |id| run.network_ids.iter().any(|n| n == id))
        })
        .collect())
}

#[allow(clippy::type_complexity)]
fn row_to_test_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<orchestrator_types::TestRun, StoreError>> {
    let run_id_text: String = row.get(1)?;
    let start_time: String = row.get(2)?;
    let end_time: Option<String> = row.get(3)?;
    let mode_json: String = row.get(4)?;
    let networks_json: String = row.get(6)?;
    let test_types_json: String = row.get(7)?;
    let totals_json: String = row.get(8)?;
    let config_json: String = row.get(9)?;

    let parsed = (|| -> Result<orchestrator_types::TestRun, StoreError> {
        Ok(orchestrator_types::TestRun {
            run_id: run_id_text
                .parse()
                .map_err(|_| StoreError::UnknownRunId(run_id_text.clone()))?,
            internal_id: row.get(0)?,
            start_time: chrono::DateTime::parse_from_rfc3339(&start_time)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StoreError::Sqlite(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))?,
            end_time: end_time
                .map(|s| {
                    chrono::DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc))
                })
                .transpose()
                .map_err(|e| StoreError::Sqlite(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))?,
            mode: serde_json::from_str(&mode_json)?,
            parallel: row.get(5)?,
            network_ids: serde_json::from_str(&networks_json)?,
            test_types: serde_json::from_str(&test_types_json)?,
            totals: serde_json::from_str(&totals_json)?,
            raw_config: serde_json::from_str(&config_json)?,
        })
    })();
    Ok(parsed)
}
