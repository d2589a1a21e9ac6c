use std::path::Path;

use rusqlite::Connection;

use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub test_runs: u64,
    pub test_results: u64,
    pub network_results: u64,
    pub performance_metrics: u64,
    pub alerts: u64,
    pub contract_deployments: u64,
    pub page_count: u64,
    pub page_size: u64,
}

pub fn vacuum(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("VACUUM;")?;
    Ok(())
}

pub fn optimize(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("PRAGMA optimize;")?;
    Ok(())
}

/// Runs the same pre-shutdown optimize pass SQLite recommends before a
/// clean exit. The file descriptor itself closes when the last `Store`
/// clone drops its `Arc`, not here.
pub fn close(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("PRAGMA optimize;")?;
    Ok(())
}

pub fn get_stats(conn: &Connection) -> Result<StoreStats, StoreError> {
    let count = |table: &str| -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        Ok(conn.query_row(&sql, [], |row| row.get::<_, i64>(0))? as u64)
    };
    Ok(StoreStats {
        test_runs: count("test_runs")?,
        test_results: count("test_results")?,
        network_results: count("network_results")?,
        performance_metrics: count("performance_metrics")?,
        alerts: count("alerts")?,
        contract_deployments: count("contract_deployments")?,
        page_count: conn.query_row("PRAGMA page_count", [], |row| row.get::<_, i64>(0))? as u64,
        page_size: conn.query_row("PRAGMA page_size", [], |row| row.get::<_, i64>(0))? as u64,
    })
}

pub fn backup(conn: &Connection, destination: &Path) -> Result<(), StoreError> {
    let mut dest = Connection::open(destination)?;
    let backup = rusqlite::backup::Backup::new(conn, &mut dest)?;
    backup.run_to_completion(5, std::time::Duration::from_millis(250), None)?;
    Ok(())
}
