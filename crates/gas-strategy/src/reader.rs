use alloy_provider::Provider;
use async_trait::async_trait;

use crate::error::GasSourceError;

/// Minimal seam between the gas strategy dispatcher and a live RPC
/// connection. Kept as a trait (rather than taking a concrete
/// `alloy_provider::RootProvider`) so unit tests can substitute a canned
/// response without dialing a node, and so the Resource Pool's provider
/// handle type doesn't need to be named here.
#[async_trait]
pub trait GasPriceSource: Send + Sync {
    async fn get_gas_price(&self) -> Result<u128, GasSourceError>;
}

#[async_trait]
impl<P> GasPriceSource for P
where
    P: Provider + Send + Sync,
{
    async fn get_gas_price(&self) -> Result<u128, GasSourceError> {
        Provider::get_gas_price(self)
            .await
            .map_err(|error| GasSourceError::Rpc(error.to_string()))
    }
}

/// Test double used by this crate's own unit tests and by downstream
/// crates that want to exercise the strategy dispatcher without a node.
#[derive(Debug, Clone, Copy)]
pub struct FixedGasSource {
    pub value: Result<u128, ()>,
}

#[async_trait]
impl GasPriceSource for FixedGasSource {
    async fn get_gas_price(&self) -> Result<u128, GasSourceError> {
        self.value
            .map_err(|()| GasSourceError::Rpc("canned failure".into()))
    }
}
