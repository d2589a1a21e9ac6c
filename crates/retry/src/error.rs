use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation exhausted its retry budget; carries the last
    /// classified error it saw.
    #[error("operation failed after {attempts} attempt(s)")]
    Exhausted { attempts: u32, source: E },

    /// The circuit breaker guarding this operation is open.
    #[error("circuit breaker is open, retry after {retry_after_ms}ms")]
    BreakerOpen { retry_after_ms: u64 },
}

impl<E> RetryError<E> {
    #[must_use]
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Exhausted { source, .. } => Some(source),
            Self::BreakerOpen { .. } => None,
        }
    }
}
