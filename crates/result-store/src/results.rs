use orchestrator_types::{ErrorCategory, NetworkResult, RunId, TestResult, TestType, Wei};
use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::runs::resolve_internal_id;

pub fn insert_network_result(conn: &Connection, result: &NetworkResult) -> Result<(), StoreError> {
    let internal_id = resolve_internal_id(conn, &result.run_id)?;
    conn.execute(
        "INSERT INTO network_results
            (run_internal_id, network_id, chain_id, totals, success, block_number_start, block_number_end, average_gas_price)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            internal_id,
            result.network_id,
            result.chain_id,
            serde_json::to_string(&result.totals)?,
            result.success,
            result.block_number_start,
            result.block_number_end,
            result.average_gas_price.map(|w| w.as_u128().to_string()),
        ],
    )?;
    Ok(())
}

pub fn get_network_results(conn: &Connection, run_id: &RunId) -> Result<Vec<NetworkResult>, StoreError> {
    let internal_id = resolve_internal_id(conn, run_id)?;
    let mut stmt = conn.prepare(
        "SELECT network_id, chain_id, totals, success, block_number_start, block_number_end, average_gas_price
         FROM network_results WHERE run_internal_id = ?1",
    )?;
    let rows = stmt
        .query_map(params![internal_id], |row| {
            let totals_json: String = row.get(2)?;
            let average_gas_price: Option<String> = row.get(6)?;
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, totals_json, row.get::<_, bool>(3)?, row.get::<_, Option<u64>>(4)?, row.get::<_, Option<u64>>(5)?, average_gas_price))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(network_id, chain_id, totals_json, success, start, end, avg_gas)| {
            Ok(NetworkResult {
                run_id: *run_id,
                network_id,
                chain_id: chain_id as u64,
                totals: serde_json::from_str(&totals_json)?,
                success,
                block_number_start: start,
                block_number_end: end,
                average_gas_price: avg_gas.and_then(|s| s.parse::<u128>().ok()).map(Wei),
            })
        })
        .collect()
}

pub fn insert_test_result(conn: &Connection, result: &TestResult) -> Result<(), StoreError> {
    let internal_id = resolve_internal_id(conn, &result.run_id)?;
    conn.execute(
        "INSERT INTO test_results
            (run_internal_id, network_id, test_type, test_name, success, start_time, end_time, duration_ms,
             gas_used, gas_price, tx_hash, block_number, error_message, error_category, cost_native,
             cost_usd_cents, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            internal_id,
            result.network_id,
            serde_json::to_string(&result.test_type)?,
            result.test_name,
            result.success,
            result.start.to_rfc3339(),
            result.end.to_rfc3339(),
            result.duration_ms,
            result.gas_used.as_u128().to_string(),
            result.gas_price.as_u128().to_string(),
            result.tx_hash,
            result.block_number,
            result.error_message,
            result.error_category.map(|c| serde_json::to_string(&c)).transpose()?,
            result.cost_native.as_u128().to_string(),
            result.cost_usd_cents,
            result.metadata.to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_test_results(
    conn: &Connection,
    run_id: &RunId,
    network_id: Option<&str>,
) -> Result<Vec<TestResult>, StoreError> {
    let internal_id = resolve_internal_id(conn, run_id)?;
    let mut sql = String::from(
        "SELECT network_id, test_type, test_name, success, start_time, end_time, duration_ms, gas_used,
                gas_price, tx_hash, block_number, error_message, error_category, cost_native, cost_usd_cents, metadata
         FROM test_results WHERE run_internal_id = ?1",
    );
    if network_id.is_some() {
        sql.push_str(" AND network_id = ?2");
    }
    let mut stmt = conn.prepare(&sql)?;

    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<Result<TestResult, StoreError>> {
        let network_id: String = row.get(0)?;
        let test_type_json: String = row.get(1)?;
        let test_name: String = row.get(2)?;
        let success: bool = row.get(3)?;
        let start: String = row.get(4)?;
        let end: String = row.get(5)?;
        let duration_ms: u64 = row.get(6)?;
        let gas_used: String = row.get(7)?;
        let gas_price: String = row.get(8)?;
        let tx_hash: Option<String> = row.get(9)?;
        let block_number: Option<u64> = row.get(10)?;
        let error_message: Option<String> = row.get(11)?;
        let error_category_json: Option<String> = row.get(12)?;
        let cost_native: String = row.get(13)?;
        let cost_usd_cents: u64 = row.get(14)?;
        let metadata: String = row.get(15)?;

        let parsed = (|| -> Result<TestResult, StoreError> {
            Ok(TestResult {
                run_id: *run_id,
                network_id,
                test_type: serde_json::from_str::<TestType>(&test_type_json)?,
                test_name,
                success,
                start: parse_rfc3339(&start)?,
                end: parse_rfc3339(&end)?,
                duration_ms,
                gas_used: Wei(gas_used.parse().unwrap_or(0)),
                gas_price: Wei(gas_price.parse().unwrap_or(0)),
                tx_hash,
                block_number,
                error_message,
                error_category: error_category_json
                    .map(|j| serde_json::from_str::<ErrorCategory>(&j))
                    .transpose()?,
                cost_native: Wei(cost_native.parse().unwrap_or(0)),
                cost_usd_cents,
                metadata: serde_json::from_str(&metadata)?,
            })
        })();
        Ok(parsed)
    };

    let rows: Vec<Result<TestResult, StoreError>> = if let Some(network) = network_id {
        stmt.query_map(params![internal_id, network], map_row)?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?
    } else {
        stmt.query_map(params![internal_id], map_row)?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?
    };
    rows.into_iter().collect()
}

fn parse_rfc3339(s: &str) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| StoreError::Sqlite(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))
}
