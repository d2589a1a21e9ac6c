use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orchestrator_types::NetworkSpec;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::PoolError;
use crate::provider::{self, ChainProvider, ProviderHandle};
use crate::signer::{SharedSigner, SignerHandle};

type ProviderKey = (u64, String);
type SignerKey = (u64, String, u32);

struct ProviderEntry {
    provider: Arc<ChainProvider>,
    refcount: AtomicI64,
    idle_since: Mutex<Option<Instant>>,
}

/// Manages reusable providers and signers per network. At most one
/// active provider exists per `(chainId, rpcUrl)`; signers share their
/// network's provider rather than opening their own connection.
pub struct ResourcePool {
    providers: Mutex<HashMap<ProviderKey, Arc<ProviderEntry>>>,
    signers: Mutex<HashMap<SignerKey, SharedSigner>>,
    idle_window: Duration,
}

impl ResourcePool {
    #[must_use]
    pub fn new(idle_window: Duration) -> Self {
        Self {
            providers: Mutex::new(HashMap::new()),
            signers: Mutex::new(HashMap::new()),
            idle_window,
        }
    }

    /// Returns a cached provider for `spec`, creating and chain-id
    /// handshaking one on first use. Secondary RPC URLs are never tried
    /// automatically here; that decision belongs to the Runner or Retry
    /// Manager.
    pub async fn get_provider(&self, spec: &NetworkSpec) -> Result<ProviderHandle, PoolError> {
        let url = spec
            .primary_rpc()
            .ok_or_else(|| PoolError::NoUsableEndpoint {
                network_id: spec.id.clone(),
            })?
            .to_string();
        let key: ProviderKey = (spec.chain_id, url.clone());

        let mut providers = self.providers.lock().await;
        if let Some(entry) = providers.get(&key) {
            entry.refcount.fetch_add(1, Ordering::SeqCst);
            *entry.idle_since.lock().await = None;
            return Ok(ProviderHandle {
                key,
                provider: entry.provider.clone(),
            });
        }

        let connected = provider::connect(&url).await?;
        provider::handshake_chain_id(&connected, &spec.id, spec.chain_id).await?;
        let entry = Arc::new(ProviderEntry {
            provider: Arc::new(connected),
            refcount: AtomicI64::new(1),
            idle_since: Mutex::new(None),
        });
        info!(network = %spec.id, chain_id = spec.chain_id, %url, "provider connected");
        providers.insert(key.clone(), entry.clone());
        Ok(ProviderHandle {
            key,
            provider: entry.provider.clone(),
        })
    }

    /// Binds a signer to the pool's provider for `spec`, reusing one if
    /// `index` was already requested for this network.
    pub async fn get_signer(
        &self,
        spec: &NetworkSpec,
        index: u32,
        private_key: &str,
    ) -> Result<SharedSigner, PoolError> {
        let provider = self.get_provider(spec).await?;
        let signer_key: SignerKey = (spec.chain_id, provider.endpoint().to_string(), index);

        let mut signers = self.signers.lock().await;
        if let Some(existing) = signers.get(&signer_key) {
            return Ok(existing.clone());
        }
        let handle = Arc::new(SignerHandle::new(index, private_key, provider)?);
        signers.insert(signer_key, handle.clone());
        Ok(handle)
    }

    /// Decrements the refcount for the provider backing `handle`. The
    /// entry becomes eligible for eviction at the next maintenance tick
    /// once `idle_window` has elapsed with a zero refcount, never sooner.
    pub async fn release(&self, handle: &ProviderHandle) {
        let providers = self.providers.lock().await;
        if let Some(entry) = providers.get(&handle.key) {
            let remaining = entry.refcount.fetch_sub(1, Ordering::SeqCst) - 1;
            if remaining <= 0 {
                *entry.idle_since.lock().await = Some(Instant::now());
            }
        }
    }

    /// Evicts providers that have been idle (refcount `<= 0`) for at
    /// least `idle_window`. Call periodically; never evicts anything
    /// still referenced.
    pub async fn evict_idle(&self) {
        let mut providers = self.providers.lock().await;
        let mut to_remove = Vec::new();
        for (key, entry) in providers.iter() {
            let idle_since = *entry.idle_since.lock().await;
            if should_evict(entry.refcount.load(Ordering::SeqCst), idle_since, self.idle_window) {
                to_remove.push(key.clone());
            }
        }
        for key in &to_remove {
            providers.remove(key);
            debug!(chain_id = key.0, url = %key.1, "evicted idle provider");
        }
    }

    /// Closes everything the pool holds. Idempotent: calling it again on
    /// an already-empty pool is a no-op.
    pub async fn cleanup(&self) {
        let mut signers = self.signers.lock().await;
        let signer_count = signers.len();
        signers.clear();
        let mut providers = self.providers.lock().await;
        let provider_count = providers.len();
        providers.clear();
        if signer_count > 0 || provider_count > 0 {
            info!(signer_count, provider_count, "resource pool cleaned up");
        }
    }
}

fn should_evict(refcount: i64, idle_since: Option<Instant>, idle_window: Duration) -> bool {
    if refcount > 0 {
        return false;
    }
    match idle_since {
        Some(since) => since.elapsed() >= idle_window,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn never_evicts_a_still_referenced_entry() {
        assert!(!should_evict(1, Some(Instant::now()), Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn never_evicts_before_idle_window_elapses() {
        assert!(!should_evict(0, Some(Instant::now()), Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_once_idle_window_elapses() {
        let since = Instant::now();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(should_evict(0, Some(since), Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn never_evicts_an_entry_that_was_never_released() {
        assert!(!should_evict(0, None, Duration::from_secs(1)));
    }
}
