use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::maintenance::vacuum;

/// Deletes every row in dependency order (children before parents) inside
/// one transaction, then vacuums. Requires `confirm` to be set explicitly;
/// a missing confirmation is refused rather than defaulted.
pub fn purge_all(conn: &mut Connection, confirm: bool) -> Result<(), StoreError> {
    if !confirm {
        return Err(StoreError::PurgeNotConfirmed { table: "*" });
    }
    let tx = conn.transaction()?;
    tx.execute_batch(
        "DELETE FROM contract_health_checks;
         DELETE FROM contract_deployments;
         DELETE FROM alerts;
         DELETE FROM network_status;
         DELETE FROM performance_metrics;
         DELETE FROM test_results;
         DELETE FROM network_results;
         DELETE FROM test_runs;",
    )?;
    tx.commit()?;
    vacuum(conn)
}

pub fn purge_older_than(conn: &mut Connection, days: u32, confirm: bool) -> Result<u64, StoreError> {
    if !confirm {
        return Err(StoreError::PurgeNotConfirmed { table: "test_runs" });
    }
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();

    let tx = conn.transaction()?;
    let stale_ids: Vec<i64> = {
        let mut stmt = tx.prepare("SELECT internal_id FROM test_runs WHERE start_time < ?1")?;
        stmt.query_map(params![cutoff], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?
    };

    tx.execute("DELETE FROM alerts WHERE triggered_at < ?1", params![cutoff])?;
    tx.execute("DELETE FROM network_status WHERE timestamp < ?1", params![cutoff])?;
    for id in &stale_ids {
        tx.execute("DELETE FROM performance_metrics WHERE run_internal_id = ?1", params![id])?;
        tx.execute("DELETE FROM test_results WHERE run_internal_id = ?1", params![id])?;
        tx.execute("DELETE FROM network_results WHERE run_internal_id = ?1", params![id])?;
        tx.execute("DELETE FROM test_runs WHERE internal_id = ?1", params![id])?;
    }
    tx.commit()?;
    vacuum(conn)?;
    Ok(stale_ids.len() as u64)
}

pub fn purge_by_network(conn: &mut Connection, network_id: &str, confirm: bool) -> Result<u64, StoreError> {
    if !confirm {
        return Err(StoreError::PurgeNotConfirmed { table: "network_results" });
    }
    let tx = conn.transaction()?;
    let removed = tx.execute(
        "DELETE FROM test_results WHERE network_id = ?1",
        params![network_id],
    )?;
    tx.execute("DELETE FROM network_results WHERE network_id = ?1", params![network_id])?;
    tx.execute(
        "DELETE FROM network_status WHERE network_id = ?1",
        params![network_id],
    )?;
    tx.execute("DELETE FROM alerts WHERE network_id = ?1", params![network_id])?;

    // Remove test_runs left with no remaining network_results (orphaned parents).
    tx.execute(
        "DELETE FROM test_runs WHERE internal_id NOT IN (SELECT DISTINCT run_internal_id FROM network_results)",
        [],
    )?;
    tx.commit()?;
    vacuum(conn)?;
    Ok(removed as u64)
}
