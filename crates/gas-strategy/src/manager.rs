use std::{
    collections::HashSet,
    sync::Mutex,
};

use chrono::Utc;
use orchestrator_types::{GasConfig, GasQuote, GasSource, NetworkSpec, NetworkType, Wei};
use tracing::warn;

use crate::reader::GasPriceSource;

/// Observed testnet gas prices above this are almost certainly a
/// misconfigured faucet/devnet rather than real congestion; worth one
/// warning per process, not one per call.
const TESTNET_SANITY_THRESHOLD_GWEI: u64 = 5_000;

/// Computes a `GasQuote` from a `NetworkSpec`'s configured strategy and a
/// live provider. Stateless aside from the one-shot sanity-warning guard;
/// does not cache quotes across calls.
pub struct GasStrategyManager {
    warned_networks: Mutex<HashSet<String>>,
}

impl Default for GasStrategyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GasStrategyManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            warned_networks: Mutex::new(HashSet::new()),
        }
    }

    /// Produces a gas quote. `aggressive_multiplier`, when set, is applied
    /// only to the `fixed` strategy's base value and reported with
    /// `GasSource::AggressiveOverride`. It is an explicit per-call
    /// override, never a first-class strategy.
    pub async fn quote(
        &self,
        spec: &NetworkSpec,
        source: &dyn GasPriceSource,
        aggressive_multiplier: Option<f64>,
    ) -> GasQuote {
        let (gas_price, gas_source) = match &spec.gas_config {
            GasConfig::Fixed { required_gwei, .. } => {
                let base = Wei::from_gwei(*required_gwei);
                match aggressive_multiplier {
                    Some(factor) => (base.saturating_mul_f64(factor), GasSource::AggressiveOverride),
                    None => (base, GasSource::Fixed),
                }
            }
            GasConfig::Adaptive {
                base_gwei,
                tolerance_gwei,
                ..
            } => self.quote_adaptive(spec, source, *base_gwei, *tolerance_gwei).await,
            GasConfig::Dynamic {
                max_gas_price_gwei, ..
            } => self.quote_dynamic(spec, source, *max_gas_price_gwei).await,
        };

        self.maybe_warn_sanity(spec, gas_price);

        GasQuote {
            gas_price,
            source: gas_source,
            observed_at: Utc::now(),
        }
    }

    async fn quote_adaptive(
        &self,
        spec: &NetworkSpec,
        source: &dyn GasPriceSource,
        base_gwei: u64,
        tolerance_gwei: u64,
    ) -> (Wei, GasSource) {
        let base = Wei::from_gwei(base_gwei);
        let floor = Wei::from_gwei(base_gwei.saturating_sub(tolerance_gwei));

        match source.get_gas_price().await {
            Ok(observed) => {
                let observed = Wei(observed);
                if observed >= floor {
                    (observed, GasSource::Adaptive)
                } else {
                    (base, GasSource::Adaptive)
                }
            }
            Err(error) => {
                warn!(network = %spec.id, %error, "adaptive gas read failed, using fallback");
                (spec.gas_config.fallback(), GasSource::Fallback)
            }
        }
    }

    async fn quote_dynamic(
        &self,
        spec: &NetworkSpec,
        source: &dyn GasPriceSource,
        max_gas_price_gwei: Option<u64>,
    ) -> (Wei, GasSource) {
        match source.get_gas_price().await {
            Ok(observed) => {
                let observed = Wei(observed);
                match max_gas_price_gwei {
                    Some(cap_gwei) => {
                        let cap = Wei::from_gwei(cap_gwei);
                        if observed > cap {
                            (cap, GasSource::Cap)
                        } else {
                            (observed, GasSource::Dynamic)
                        }
                    }
                    None => (observed, GasSource::Dynamic),
                }
            }
            Err(error) => {
                warn!(network = %spec.id, %error, "dynamic gas read failed, using fallback");
                (spec.gas_config.fallback(), GasSource::Fallback)
            }
        }
    }

    /// Ratio of `gas_price` over the network's configured mainnet
    /// comparison price, used by reporting to show "Nx cheaper than L1".
    pub fn compare_to_mainnet(
        spec: &NetworkSpec,
        gas_price: Wei,
    ) -> Result<f64, crate::error::GasStrategyError> {
        let mainnet_gwei = spec.mainnet_gas_price_gwei.ok_or_else(|| {
            crate::error::GasStrategyError::NoMainnetComparisonPrice {
                network_id: spec.id.clone(),
            }
        })?;
        let mainnet = Wei::from_gwei(mainnet_gwei).as_u128() as f64;
        if mainnet == 0.0 {
            return Ok(0.0);
        }
        Ok(gas_price.as_u128() as f64 / mainnet)
    }

    fn maybe_warn_sanity(&self, spec: &NetworkSpec, gas_price: Wei) {
        if spec.network_type != NetworkType::Testnet {
            return;
        }
        if gas_price < Wei::from_gwei(TESTNET_SANITY_THRESHOLD_GWEI) {
            return;
        }
        let mut warned = self.warned_networks.lock().expect("warn guard poisoned");
        if warned.insert(spec.id.clone()) {
            warn!(
                network = %spec.id,
                gas_price = %gas_price,
                "observed gas price on testnet exceeds sanity threshold"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use orchestrator_types::{FeatureSet, Timeouts};

    use super::*;
    use crate::reader::FixedGasSource;

    fn spec_with(gas_config: GasConfig, network_type: NetworkType) -> NetworkSpec {
        NetworkSpec {
            id: "testnet-a".into(),
            name: "Testnet A".into(),
            chain_id: 1_337,
            symbol: "ETH".into(),
            network_type,
            rpc_endpoints: vec!["https://rpc.example".into()],
            ws_endpoints: vec![],
            explorer: None,
            faucet: None,
            gas_config,
            mainnet_gas_price_gwei: None,
            timeouts: Timeouts {
                send_ms: 1_000,
                receipt_ms: 1_000,
                deployment_ms: 1_000,
                confirmation_ms: 1_000,
            },
            features: FeatureSet::default(),
            finality_blocks: 12,
        }
    }

    #[tokio::test]
    async fn fixed_returns_configured_value_without_consulting_network() {
        let spec = spec_with(
            GasConfig::Fixed {
                required_gwei: 7,
                tolerance_gwei: 0,
            },
            NetworkType::Testnet,
        );
        let source = FixedGasSource { value: Err(()) };
        let manager = GasStrategyManager::new();
        let quote = manager.quote(&spec, &source, None).await;
        assert_eq!(quote.gas_price, Wei::from_gwei(7));
        assert_eq!(quote.source, GasSource::Fixed);
    }

    #[tokio::test]
    async fn fixed_with_aggressive_override_multiplies_base() {
        let spec = spec_with(
            GasConfig::Fixed {
                required_gwei: 10,
                tolerance_gwei: 0,
            },
            NetworkType::Mainnet,
        );
        let source = FixedGasSource { value: Ok(0) };
        let manager = GasStrategyManager::new();
        let quote = manager.quote(&spec, &source, Some(1.5)).await;
        assert_eq!(quote.gas_price, Wei::from_gwei(15));
        assert_eq!(quote.source, GasSource::AggressiveOverride);
    }

    #[tokio::test]
    async fn adaptive_returns_observed_when_within_tolerance() {
        let spec = spec_with(
            GasConfig::Adaptive {
                base_gwei: 10,
                tolerance_gwei: 2,
                fallback_gwei: 3,
            },
            NetworkType::Testnet,
        );
        let source = FixedGasSource {
            value: Ok(Wei::from_gwei(9).as_u128()),
        };
        let manager = GasStrategyManager::new();
        let quote = manager.quote(&spec, &source, None).await;
        assert_eq!(quote.gas_price, Wei::from_gwei(9));
        assert_eq!(quote.source, GasSource::Adaptive);
    }

    #[tokio::test]
    async fn adaptive_falls_back_to_base_below_tolerance() {
        let spec = spec_with(
            GasConfig::Adaptive {
                base_gwei: 10,
                tolerance_gwei: 1,
                fallback_gwei: 3,
            },
            NetworkType::Testnet,
        );
        let source = FixedGasSource {
            value: Ok(Wei::from_gwei(5).as_u128()),
        };
        let manager = GasStrategyManager::new();
        let quote = manager.quote(&spec, &source, None).await;
        assert_eq!(quote.gas_price, Wei::from_gwei(10));
    }

    #[tokio::test]
    async fn adaptive_rpc_failure_uses_fallback() {
        let spec = spec_with(
            GasConfig::Adaptive {
                base_gwei: 10,
                tolerance_gwei: 1,
                fallback_gwei: 3,
            },
            NetworkType::Testnet,
        );
        let source = FixedGasSource { value: Err(()) };
        let manager = GasStrategyManager::new();
        let quote = manager.quote(&spec, &source, None).await;
        assert_eq!(quote.gas_price, Wei::from_gwei(3));
        assert_eq!(quote.source, GasSource::Fallback);
    }

    #[tokio::test]
    async fn dynamic_never_exceeds_cap() {
        let spec = spec_with(
            GasConfig::Dynamic {
                max_gas_price_gwei: Some(20),
                fallback_gwei: 5,
            },
            NetworkType::Mainnet,
        );
        let source = FixedGasSource {
            value: Ok(Wei::from_gwei(50).as_u128()),
        };
        let manager = GasStrategyManager::new();
        let quote = manager.quote(&spec, &source, None).await;
        assert_eq!(quote.gas_price, Wei::from_gwei(20));
        assert_eq!(quote.source, GasSource::Cap);
    }

    #[tokio::test]
    async fn dynamic_without_cap_returns_observed() {
        let spec = spec_with(
            GasConfig::Dynamic {
                max_gas_price_gwei: None,
                fallback_gwei: 5,
            },
            NetworkType::Mainnet,
        );
        let source = FixedGasSource {
            value: Ok(Wei::from_gwei(50).as_u128()),
        };
        let manager = GasStrategyManager::new();
        let quote = manager.quote(&spec, &source, None).await;
        assert_eq!(quote.gas_price, Wei::from_gwei(50));
        assert_eq!(quote.source, GasSource::Dynamic);
    }

    #[tokio::test]
    async fn sanity_warning_fires_once_per_network() {
        let spec = spec_with(
            GasConfig::Dynamic {
                max_gas_price_gwei: None,
                fallback_gwei: 5,
            },
            NetworkType::Testnet,
        );
        let source = FixedGasSource {
            value: Ok(Wei::from_gwei(TESTNET_SANITY_THRESHOLD_GWEI + 1).as_u128()),
        };
        let manager = GasStrategyManager::new();
        manager.quote(&spec, &source, None).await;
        manager.quote(&spec, &source, None).await;
        assert_eq!(manager.warned_networks.lock().unwrap().len(), 1);
    }

    #[test]
    fn compare_to_mainnet_without_reference_price_errors() {
        let spec = spec_with(
            GasConfig::Dynamic {
                max_gas_price_gwei: None,
                fallback_gwei: 1,
            },
            NetworkType::Testnet,
        );
        let error = GasStrategyManager::compare_to_mainnet(&spec, Wei::from_gwei(1)).unwrap_err();
        assert!(matches!(
            error,
            crate::error::GasStrategyError::NoMainnetComparisonPrice { .. }
        ));
    }

    #[test]
    fn compare_to_mainnet_computes_ratio() {
        let mut spec = spec_with(
            GasConfig::Dynamic {
                max_gas_price_gwei: None,
                fallback_gwei: 1,
            },
            NetworkType::Local,
        );
        spec.mainnet_gas_price_gwei = Some(20);
        let ratio = GasStrategyManager::compare_to_mainnet(&spec, Wei::from_gwei(5)).unwrap();
        assert!((ratio - 0.25).abs() < f64::EPSILON);
    }
}
