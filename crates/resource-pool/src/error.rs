use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("network {network_id} has no usable rpc endpoint")]
    NoUsableEndpoint { network_id: String },

    #[error("rpc call failed against {url}: {message}")]
    Connect { url: String, message: String },

    #[error("chain id handshake failed for {network_id}: expected {expected}, rpc reported {reported}")]
    ChainIdMismatch {
        network_id: String,
        expected: u64,
        reported: u64,
    },

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
}
