use orchestrator_types::{Alert, AlertSeverity};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

pub fn insert_alert(conn: &Connection, alert: &Alert) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO alerts (kind, severity, network_id, test_type, message, details, resolved, resolved_at, triggered_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, ?7)",
        params![
            alert.kind,
            serde_json::to_string(&alert.severity)?,
            alert.network_id,
            alert.test_type,
            alert.message,
            alert.details.to_string(),
            alert.triggered_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn resolve_alert(conn: &Connection, id: i64) -> Result<bool, StoreError> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM alerts WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    if exists.is_none() {
        return Ok(false);
    }
    conn.execute(
        "UPDATE alerts SET resolved = 1, resolved_at = ?1 WHERE id = ?2",
        params![chrono::Utc::now().to_rfc3339(), id],
    )?;
    Ok(true)
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub network_id: Option<String>,
    pub min_severity: Option<AlertSeverity>,
    pub unresolved_only: bool,
}

pub fn get_alerts(conn: &Connection, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, severity, network_id, test_type, message, details, triggered_at, resolved_at, resolved
         FROM alerts
         WHERE (:network_id IS NULL OR network_id = :network_id)
           AND (:unresolved_only = 0 OR resolved = 0)
         ORDER BY triggered_at DESC",
    )?;
    let rows = stmt
        .query_map(
            rusqlite::named_params! {
                ":network_id": filter.network_id,
                ":unresolved_only": filter.unresolved_only,
            },
            |row| {
                let severity_json: String = row.get(2)?;
                let details: String = row.get(6)?;
                let triggered_at: String = row.get(7)?;
                let resolved_at: Option<String> = row.get(8)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    severity_json,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    details,
                    triggered_at,
                    resolved_at,
                ))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(id, kind, severity_json, network_id, test_type, message, details, triggered_at, resolved_at)| {
                Ok(Alert {
                    id,
                    kind,
                    severity: serde_json::from_str(&severity_json)?,
                    network_id,
                    test_type,
                    message,
                    details: serde_json::from_str(&details)?,
                    triggered_at: chrono::DateTime::parse_from_rfc3339(&triggered_at)
                        .map(|dt| dt.with_timezone(&chrono::Utc))
                        .unwrap_or_else(|_| chrono::Utc::now()),
                    resolved_at: resolved_at.and_then(|s| {
                        chrono::DateTime::parse_from_rfc3339(&s)
                            .ok()
                            .map(|dt| dt.with_timezone(&chrono::Utc))
                    }),
                })
            },
        )
        .filter(|alert: &Result<Alert, StoreError>| match (alert, filter.min_severity) {
            (Ok(a), Some(min)) => a.severity >= min,
            _ => true,
        })
        .collect()
}
