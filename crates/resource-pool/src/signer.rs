use std::str::FromStr;
use std::sync::Arc;

use alloy_signer_local::PrivateKeySigner;
use tokio::sync::Mutex;

use crate::error::PoolError;
use crate::provider::ProviderHandle;

/// A signer bound to the pool's provider for one network. Caches its own
/// pending nonce so repeated transactions from the same signer don't each
/// pay an RPC round-trip.
pub struct SignerHandle {
    pub(crate) index: u32,
    pub(crate) signer: PrivateKeySigner,
    pub(crate) provider: ProviderHandle,
    pending_nonce: Mutex<Option<u64>>,
}

impl SignerHandle {
    pub(crate) fn new(index: u32, private_key: &str, provider: ProviderHandle) -> Result<Self, PoolError> {
        let signer = PrivateKeySigner::from_str(private_key)
            .map_err(|error| PoolError::InvalidPrivateKey(error.to_string()))?;
        Ok(Self {
            index,
            signer,
            provider,
            pending_nonce: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[must_use]
    pub fn address(&self) -> alloy_primitives::Address {
        use alloy_signer::Signer;
        self.signer.address()
    }

    #[must_use]
    pub fn provider(&self) -> &ProviderHandle {
        &self.provider
    }

    /// Returns the cached pending nonce, fetching and caching it from the
    /// provider on first use. Callers that submit a transaction are
    /// expected to call [`Self::advance_nonce`] afterward.
    pub async fn next_nonce(&self) -> Result<u64, PoolError> {
        use alloy_provider::Provider;

        let mut cached = self.pending_nonce.lock().await;
        if let Some(nonce) = *cached {
            return Ok(nonce);
        }
        let nonce = self
            .provider
            .get_transaction_count(self.address())
            .await
            .map_err(|error| PoolError::Connect {
                url: self.provider.endpoint().to_string(),
                message: error.to_string(),
            })?;
        *cached = Some(nonce);
        Ok(nonce)
    }

    pub async fn advance_nonce(&self) {
        let mut cached = self.pending_nonce.lock().await;
        *cached = Some(cached.unwrap_or(0) + 1);
    }

    pub async fn reset_nonce(&self) {
        *self.pending_nonce.lock().await = None;
    }
}

pub type SharedSigner = Arc<SignerHandle>;
