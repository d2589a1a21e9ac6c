use std::ops::Deref;
use std::sync::Arc;

use alloy_provider::{Provider, ProviderBuilder, RootProvider};

/// Network-agnostic alias for the concrete provider type the pool hands
/// out. Kept as a type alias (rather than a trait object) so callers get
/// the full `alloy_provider::Provider` API without extra indirection.
pub type ChainProvider = RootProvider;

/// Reference-counted handle to a pooled provider. Cloning does not
/// increment the pool's refcount; only [`crate::pool::ResourcePool::get_provider`]
/// does that. Clone this handle freely once acquired, and call
/// [`crate::pool::ResourcePool::release`] exactly once per `get_provider`
/// call when done with it.
#[derive(Clone)]
pub struct ProviderHandle {
    pub(crate) key: (u64, String),
    pub(crate) provider: Arc<ChainProvider>,
}

impl ProviderHandle {
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.key.0
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.key.1
    }
}

impl Deref for ProviderHandle {
    type Target = ChainProvider;

    fn deref(&self) -> &Self::Target {
        &self.provider
    }
}

pub(crate) async fn connect(url: &str) -> Result<ChainProvider, crate::error::PoolError> {
    let parsed = url.parse().map_err(|_| crate::error::PoolError::NoUsableEndpoint {
        network_id: url.to_string(),
    })?;
    Ok(ProviderBuilder::new().on_http(parsed))
}

pub(crate) async fn handshake_chain_id(
    provider: &ChainProvider,
    network_id: &str,
    expected: u64,
) -> Result<(), crate::error::PoolError> {
    let reported = provider
        .get_chain_id()
        .await
        .map_err(|error| crate::error::PoolError::Connect {
            url: network_id.to_string(),
            message: error.to_string(),
        })?;
    if reported != expected {
        return Err(crate::error::PoolError::ChainIdMismatch {
            network_id: network_id.to_string(),
            expected,
            reported,
        });
    }
    Ok(())
}
