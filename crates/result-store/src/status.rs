use orchestrator_types::NetworkStatus;
use rusqlite::{params, Connection};

use crate::error::StoreError;

pub fn insert_network_status(conn: &Connection, status: &NetworkStatus) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO network_status
            (network_id, chain_id, block_number, gas_price, response_time_ms, online, timestamp, rpc_url, error_message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            status.network_id,
            status.chain_id,
            status.block_number,
            status.gas_price.as_u128().to_string(),
            status.response_time_ms,
            status.online,
            status.timestamp.to_rfc3339(),
            status.rpc_url,
            status.error_message,
        ],
    )?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct StatusFilter {
    pub network_id: Option<String>,
    pub online_only: bool,
    pub limit: Option<u32>,
}

pub fn get_network_status(conn: &Connection, filter: &StatusFilter) -> Result<Vec<NetworkStatus>, StoreError> {
    let sql = format!(
        "SELECT network_id, chain_id, block_number, gas_price, response_time_ms, online, timestamp, rpc_url, error_message
         FROM network_status
         WHERE (:network_id IS NULL OR network_id = :network_id)
           AND (:online_only = 0 OR online = 1)
         ORDER BY timestamp DESC
         {}",
        filter.limit.map(|n| format!("LIMIT {n}")).unwrap_or_default()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            rusqlite::named_params! {
                ":network_id": filter.network_id,
                ":online_only": filter.online_only,
            },
            |row| {
                let gas_price: String = row.get(3)?;
                let timestamp: String = row.get(6)?;
                Ok(NetworkStatus {
                    network_id: row.get(0)?,
                    chain_id: row.get::<_, i64>(1)? as u64,
                    block_number: row.get::<_, i64>(2)? as u64,
                    gas_price: orchestrator_types::Wei(gas_price.parse().unwrap_or(0)),
                    response_time_ms: row.get::<_, i64>(4)? as u64,
                    online: row.get(5)?,
                    timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
                        .map(|dt| dt.with_timezone(&chrono::Utc))
                        .unwrap_or_else(|_| chrono::Utc::now()),
                    rpc_url: row.get(7)?,
                    error_message: row.get(8)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
