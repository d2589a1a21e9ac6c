use rusqlite::Connection;

use crate::error::StoreError;

/// Applies pragmas and creates every table if missing. Safe to call on
/// every startup.
pub fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "cache_size", -4_000)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS test_runs (
            internal_id   INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id        TEXT NOT NULL UNIQUE,
            start_time    TEXT NOT NULL,
            end_time      TEXT,
            duration_ms   INTEGER,
            mode          TEXT NOT NULL,
            parallel      INTEGER NOT NULL,
            networks      TEXT NOT NULL,
            test_types    TEXT NOT NULL,
            totals        TEXT NOT NULL,
            config        TEXT NOT NULL,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS network_results (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            run_internal_id     INTEGER NOT NULL REFERENCES test_runs(internal_id),
            network_id          TEXT NOT NULL,
            chain_id            INTEGER NOT NULL,
            totals              TEXT NOT NULL,
            success             INTEGER NOT NULL,
            block_number_start  INTEGER,
            block_number_end    INTEGER,
            average_gas_price   TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_network_results_run ON network_results(run_internal_id);

        CREATE TABLE IF NOT EXISTS test_results (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            run_internal_id   INTEGER NOT NULL REFERENCES test_runs(internal_id),
            network_id        TEXT NOT NULL,
            test_type         TEXT NOT NULL,
            test_name         TEXT NOT NULL,
            success           INTEGER NOT NULL,
            start_time        TEXT NOT NULL,
            end_time          TEXT NOT NULL,
            duration_ms       INTEGER NOT NULL,
            gas_used          TEXT NOT NULL,
            gas_price         TEXT NOT NULL,
            tx_hash           TEXT,
            block_number      INTEGER,
            error_message     TEXT,
            error_category    TEXT,
            cost_native       TEXT NOT NULL,
            cost_usd_cents    INTEGER NOT NULL,
            metadata          TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_test_results_run ON test_results(run_internal_id);
        CREATE INDEX IF NOT EXISTS idx_test_results_network ON test_results(network_id);

        CREATE TABLE IF NOT EXISTS performance_metrics (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            run_internal_id   INTEGER NOT NULL REFERENCES test_runs(internal_id),
            network_id        TEXT NOT NULL,
            name              TEXT NOT NULL,
            value             REAL NOT NULL,
            unit              TEXT NOT NULL,
            timestamp         TEXT NOT NULL,
            test_type         TEXT,
            extra             TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_metrics_run ON performance_metrics(run_internal_id);
        CREATE INDEX IF NOT EXISTS idx_metrics_name_time ON performance_metrics(name, timestamp);

        CREATE TABLE IF NOT EXISTS network_status (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            network_id        TEXT NOT NULL,
            chain_id          INTEGER NOT NULL,
            block_number      INTEGER NOT NULL,
            gas_price         TEXT NOT NULL,
            response_time_ms  INTEGER NOT NULL,
            online            INTEGER NOT NULL,
            timestamp         TEXT NOT NULL,
            rpc_url           TEXT NOT NULL,
            error_message     TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_network_status_network ON network_status(network_id, timestamp);

        CREATE TABLE IF NOT EXISTS alerts (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            kind           TEXT NOT NULL,
            severity       TEXT NOT NULL,
            network_id     TEXT,
            test_type      TEXT,
            message        TEXT NOT NULL,
            details        TEXT NOT NULL,
            resolved       INTEGER NOT NULL DEFAULT 0,
            resolved_at    TEXT,
            triggered_at   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_alerts_resolved ON alerts(resolved);

        CREATE TABLE IF NOT EXISTS contract_deployments (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            deployment_id       TEXT NOT NULL UNIQUE,
            network_id          TEXT NOT NULL,
            chain_id            INTEGER NOT NULL,
            name                TEXT NOT NULL,
            contract_type       TEXT NOT NULL,
            address             TEXT NOT NULL,
            tx_hash             TEXT NOT NULL,
            block_number        INTEGER NOT NULL,
            gas_used            TEXT NOT NULL,
            gas_price           TEXT NOT NULL,
            deployed_at         TEXT NOT NULL,
            deployer            TEXT NOT NULL,
            constructor_args    TEXT NOT NULL,
            abi                 TEXT NOT NULL,
            bytecode_hash       TEXT NOT NULL,
            version             INTEGER NOT NULL,
            active              INTEGER NOT NULL,
            verified            INTEGER NOT NULL,
            health_status       TEXT NOT NULL,
            last_health_check   TEXT,
            metadata            TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_deployments_chain_type_name_active
            ON contract_deployments(chain_id, contract_type, name, active);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_deployments_one_active
            ON contract_deployments(chain_id, contract_type, name)
            WHERE active = 1;

        CREATE TABLE IF NOT EXISTS contract_health_checks (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            deployment_id       TEXT NOT NULL REFERENCES contract_deployments(deployment_id),
            check_time          TEXT NOT NULL,
            status              TEXT NOT NULL,
            response_time_ms    INTEGER NOT NULL,
            gas_price_at_check  TEXT NOT NULL,
            error_message       TEXT,
            checks              TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_health_checks_deployment ON contract_health_checks(deployment_id);
        ",
    )?;
    Ok(())
}
