use thiserror::Error;

#[derive(Debug, Error)]
pub enum GasSourceError {
    #[error("RPC call failed: {0}")]
    Rpc(String),
}

/// Raised only when the network's `gasConfig` is missing fields required by
/// the chosen strategy: a configuration/programmer error, never a
/// transient RPC failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GasStrategyError {
    #[error("network '{network_id}' has no mainnet gas price to compare against")]
    NoMainnetComparisonPrice { network_id: String },
}
