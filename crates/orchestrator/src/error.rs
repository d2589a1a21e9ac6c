use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("loading network specs from {dir}: {source}")]
    NetworkRegistry {
        dir: String,
        #[source]
        source: orchestrator_network_registry::RegistryError,
    },

    #[error("opening result store at {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: orchestrator_result_store::StoreError,
    },

    #[error("no usable network specs found in {0}")]
    EmptyRegistry(String),
}
