use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] orchestrator_result_store::StoreError),

    #[error("no abi recorded for deployment {0}")]
    MissingAbi(String),
}
