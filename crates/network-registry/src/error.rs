use thiserror::Error;

/// One structured validation failure: which field, what went wrong.
/// Mirrors the `path`/`message` shape `serde_path_to_error` produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{file}: schema violation(s): {}", .issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidSchema {
        file: String,
        issues: Vec<ValidationIssue>,
    },
    #[error("{id} (chain {chain_id}): no RPC endpoint survived template expansion")]
    NoUsableEndpoint { id: String, chain_id: u64 },
    #[error("failed to read network spec directory '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
