use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("no test run found for run id {0}")]
    UnknownRunId(String),

    #[error("purge of {table} requires explicit confirmation")]
    PurgeNotConfirmed { table: &'static str },

    #[error("blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
