use orchestrator_types::{ContractDeployment, ContractType, HealthCheck, HealthStatus};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

/// Inserts a deployment row. The partial unique index on
/// `(chain_id, contract_type, name) WHERE active = 1` enforces "at most
/// one active deployment per network+type+name" at the database layer;
/// callers must `mark_inactive` the previous active row first.
pub fn save_deployment(conn: &Connection, deployment: &ContractDeployment) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO contract_deployments
            (deployment_id, network_id, chain_id, name, contract_type, address, tx_hash, block_number,
             gas_used, gas_price, deployed_at, deployer, constructor_args, abi, bytecode_hash, version,
             active, verified, health_status, last_health_check, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            deployment.deployment_id.to_string(),
            deployment.network_id,
            deployment.chain_id,
            deployment.name,
            serde_json::to_string(&deployment.contract_type)?,
            deployment.address,
            deployment.tx_hash,
            deployment.block_number,
            deployment.gas_used.as_u128().to_string(),
            deployment.gas_price.as_u128().to_string(),
            deployment.deployed_at.to_rfc3339(),
            deployment.deployer,
            deployment.constructor_args.to_string(),
            deployment.abi.to_string(),
            deployment.bytecode_hash,
            deployment.version,
            deployment.active,
            deployment.verified,
            serde_json::to_string(&deployment.health_status)?,
            deployment.last_health_check.map(|dt| dt.to_rfc3339()),
            deployment.metadata.to_string(),
        ],
    )?;
    Ok(())
}

pub fn mark_inactive(conn: &Connection, deployment_id: &str) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "UPDATE contract_deployments SET active = 0 WHERE deployment_id = ?1 AND active = 1",
        params![deployment_id],
    )?;
    Ok(changed > 0)
}

/// Supersedes whatever active row exists for `(chain_id, contract_type, name)`
/// and inserts `deployment` in its place, both inside one transaction, so a
/// reader never observes a window with zero active rows for that key.
pub fn save_superseding(conn: &mut Connection, deployment: &ContractDeployment) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    if deployment.active {
        if let Some(previous) = get_active(&tx, deployment.chain_id, deployment.contract_type, &deployment.name)? {
            mark_inactive(&tx, &previous.deployment_id.to_string())?;
        }
    }
    save_deployment(&tx, deployment)?;
    tx.commit()?;
    Ok(())
}

pub fn get_active(
    conn: &Connection,
    chain_id: u64,
    contract_type: ContractType,
    name: &str,
) -> Result<Option<ContractDeployment>, StoreError> {
    conn.query_row(
        "SELECT deployment_id, network_id, chain_id, name, contract_type, address, tx_hash, block_number,
                gas_used, gas_price, deployed_at, deployer, constructor_args, abi, bytecode_hash, version,
                active, verified, health_status, last_health_check, metadata
         FROM contract_deployments
         WHERE chain_id = ?1 AND contract_type = ?2 AND name = ?3 AND active = 1",
        params![chain_id, serde_json::to_string(&contract_type)?, name],
        row_to_deployment,
    )
    .optional()?
    .transpose()
}

pub fn get_active_by_type(
    conn: &Connection,
    chain_id: u64,
    contract_type: ContractType,
) -> Result<Vec<ContractDeployment>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT deployment_id, network_id, chain_id, name, contract_type, address, tx_hash, block_number,
                gas_used, gas_price, deployed_at, deployer, constructor_args, abi, bytecode_hash, version,
                active, verified, health_status, last_health_check, metadata
         FROM contract_deployments WHERE chain_id = ?1 AND contract_type = ?2 AND active = 1",
    )?;
    let rows = stmt
        .query_map(params![chain_id, serde_json::to_string(&contract_type)?], row_to_deployment)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().collect()
}

pub fn get_all_by_network(conn: &Connection, network_id: &str) -> Result<Vec<ContractDeployment>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT deployment_id, network_id, chain_id, name, contract_type, address, tx_hash, block_number,
                gas_used, gas_price, deployed_at, deployer, constructor_args, abi, bytecode_hash, version,
                active, verified, health_status, last_health_check, metadata
         FROM contract_deployments WHERE network_id = ?1 ORDER BY deployed_at DESC",
    )?;
    let rows = stmt
        .query_map(params![network_id], row_to_deployment)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().collect()
}

pub fn get_abi(conn: &Connection, deployment_id: &str) -> Result<Option<serde_json::Value>, StoreError> {
    let abi: Option<String> = conn
        .query_row(
            "SELECT abi FROM contract_deployments WHERE deployment_id = ?1",
            params![deployment_id],
            |row| row.get(0),
        )
        .optional()?;
    abi.map(|text| serde_json::from_str(&text).map_err(StoreError::from))
        .transpose()
}

pub fn update_health(
    conn: &Connection,
    deployment_id: &str,
    status: HealthStatus,
    checked_at: chrono::DateTime<chrono::Utc>,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE contract_deployments SET health_status = ?1, last_health_check = ?2 WHERE deployment_id = ?3",
        params![serde_json::to_string(&status)?, checked_at.to_rfc3339(), deployment_id],
    )?;
    Ok(())
}

pub fn insert_health_check(conn: &Connection, check: &HealthCheck) -> Result<(), StoreError> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM contract_deployments WHERE deployment_id = ?1",
            params![check.deployment_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        // Health checks silently no-op if their deployment no longer exists.
        return Ok(());
    }
    conn.execute(
        "INSERT INTO contract_health_checks
            (deployment_id, check_time, status, response_time_ms, gas_price_at_check, error_message, checks)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            check.deployment_id.to_string(),
            check.check_time.to_rfc3339(),
            serde_json::to_string(&check.status)?,
            check.response_time_ms,
            check.gas_price_at_check.as_u128().to_string(),
            check.error_message,
            check.checks.to_string(),
        ],
    )?;
    Ok(())
}

pub fn cleanup_old_health_checks(conn: &Connection, older_than_days: u32) -> Result<u64, StoreError> {
    let cutoff = chrono::Utc::now() - chrono::Duration::days(i64::from(older_than_days));
    let removed = conn.execute(
        "DELETE FROM contract_health_checks WHERE check_time < ?1",
        params![cutoff.to_rfc3339()],
    )?;
    Ok(removed as u64)
}

#[derive(Debug, Clone, Default)]
pub struct DeploymentStats {
    pub total: u64,
    pub active: u64,
    pub verified: u64,
    pub by_type: Vec<(ContractType, u64)>,
}

pub fn get_deployment_stats(conn: &Connection) -> Result<DeploymentStats, StoreError> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM contract_deployments", [], |row| row.get(0))?;
    let active: i64 = conn.query_row(
        "SELECT COUNT(*) FROM contract_deployments WHERE active = 1",
        [],
        |row| row.get(0),
    )?;
    let verified: i64 = conn.query_row(
        "SELECT COUNT(*) FROM contract_deployments WHERE verified = 1",
        [],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare("SELECT contract_type, COUNT(*) FROM contract_deployments GROUP BY contract_type")?;
    let by_type = stmt
        .query_map([], |row| {
            let type_json: String = row.get(0)?;
            Ok((type_json, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(type_json, count)| Ok((serde_json::from_str::<ContractType>(&type_json)?, count as u64)))
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(DeploymentStats {
        total: total as u64,
        active: active as u64,
        verified: verified as u64,
        by_type,
    })
}

#[allow(clippy::type_complexity)]
fn row_to_deployment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<ContractDeployment, StoreError>> {
    let deployment_id: String = row.get(0)?;
    let contract_type_json: String = row.get(4)?;
    let gas_used: String = row.get(8)?;
    let gas_price: String = row.get(9)?;
    let deployed_at: String = row.get(10)?;
    let health_status_json: String = row.get(18)?;
    let last_health_check: Option<String> = row.get(19)?;

    let parsed = (|| -> Result<ContractDeployment, StoreError> {
        Ok(ContractDeployment {
            deployment_id: deployment_id
                .parse()
                .map_err(|_| StoreError::Sqlite(rusqlite::Error::InvalidColumnType(0, "deployment_id".into(), rusqlite::types::Type::Text)))?,
            network_id: row.get(1)?,
            chain_id: row.get::<_, i64>(2)? as u64,
            name: row.get(3)?,
            contract_type: serde_json::from_str(&contract_type_json)?,
            address: row.get(5)?,
            tx_hash: row.get(6)?,
            block_number: row.get::<_, i64>(7)? as u64,
            gas_used: orchestrator_types::Wei(gas_used.parse().unwrap_or(0)),
            gas_price: orchestrator_types::Wei(gas_price.parse().unwrap_or(0)),
            deployed_at: chrono::DateTime::parse_from_rfc3339(&deployed_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            deployer: row.get(11)?,
            constructor_args: serde_json::from_str(&row.get::<_, String>(12)?).unwrap_or(serde_json::Value::Null),
            abi: serde_json::from_str(&row.get::<_, String>(13)?).unwrap_or(serde_json::Value::Null),
            bytecode_hash: row.get(14)?,
            version: row.get::<_, i64>(15)? as u32,
            active: row.get(16)?,
            verified: row.get(17)?,
            health_status: serde_json::from_str(&health_status_json)?,
            last_health_check: last_health_check.and_then(|s| {
                chrono::DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&chrono::Utc))
            }),
            metadata: serde_json::from_str(&row.get::<_, String>(20)?).unwrap_or(serde_json::Value::Null),
        })
    })();
    Ok(parsed)
}
