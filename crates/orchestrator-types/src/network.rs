use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wei::Wei;

/// Kind of network, used for filtering (`byType`) and for deciding default
/// caution levels (mainnets get stricter gas sanity checks than testnets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Local,
}

/// Feature bits a network may advertise. Modeled as a set rather than a
/// bitfield integer so new features can be added without a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Eip1559,
    Create2,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(pub BTreeSet<Feature>);

impl FeatureSet {
    #[must_use]
    pub fn has(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }
}

/// Tagged union of gas price strategies. The presence of a required field is
/// enforced at the type level by giving each variant its own struct instead
/// of one struct with a pile of `Option<T>` fields the source used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum GasConfig {
    Fixed {
        #[serde(rename = "requiredGwei")]
        required_gwei: u64,
        #[serde(rename = "toleranceGwei")]
        tolerance_gwei: u64,
    },
    Adaptive {
        #[serde(rename = "baseGwei")]
        base_gwei: u64,
        #[serde(rename = "toleranceGwei")]
        tolerance_gwei: u64,
        #[serde(rename = "fallbackGwei")]
        fallback_gwei: u64,
    },
    Dynamic {
        #[serde(rename = "maxGasPriceGwei")]
        max_gas_price_gwei: Option<u64>,
        #[serde(rename = "fallbackGwei")]
        fallback_gwei: u64,
    },
}

impl GasConfig {
    #[must_use]
    pub const fn fallback(&self) -> Wei {
        match self {
            Self::Fixed { required_gwei, .. } => Wei::from_gwei(*required_gwei),
            Self::Adaptive { fallback_gwei, .. } | Self::Dynamic { fallback_gwei, .. } => {
                Wei::from_gwei(*fallback_gwei)
            }
        }
    }
}

/// Per-operation deadlines. All are split into coarse phases the way the
/// Test Runner needs them (send vs. receipt, deployment vs. confirmation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeouts {
    pub send_ms: u64,
    pub receipt_ms: u64,
    pub deployment_ms: u64,
    pub confirmation_ms: u64,
}

impl Timeouts {
    #[must_use]
    pub const fn send(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.send_ms)
    }

    #[must_use]
    pub const fn receipt(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.receipt_ms)
    }

    #[must_use]
    pub const fn deployment(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.deployment_ms)
    }

    #[must_use]
    pub const fn confirmation(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.confirmation_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub base_url: String,
    pub tx_url_template: String,
    pub address_url_template: String,
}

impl ExplorerConfig {
    #[must_use]
    pub fn tx_url(&self, tx_hash: &str) -> String {
        self.tx_url_template.replace("{hash}", tx_hash)
    }

    #[must_use]
    pub fn address_url(&self, address: &str) -> String {
        self.address_url_template.replace("{address}", address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetConfig {
    pub url: String,
    pub amount: String,
    pub cooldown_secs: u64,
}

/// Immutable description of one network, produced by the Network Registry
/// and consumed by every other component. Never mutated after load;
/// `refresh()` replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    pub id: String,
    pub name: String,
    pub chain_id: u64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    pub rpc_endpoints: Vec<String>,
    #[serde(default)]
    pub ws_endpoints: Vec<String>,
    #[serde(default)]
    pub explorer: Option<ExplorerConfig>,
    #[serde(default)]
    pub faucet: Option<FaucetConfig>,
    pub gas_config: GasConfig,
    #[serde(default)]
    pub mainnet_gas_price_gwei: Option<u64>,
    pub timeouts: Timeouts,
    #[serde(default)]
    pub features: FeatureSet,
    /// Additional blocks past inclusion after which the finality phase
    /// treats a transaction as irreversible.
    #[serde(default = "default_finality_blocks")]
    pub finality_blocks: u64,
}

const fn default_finality_blocks() -> u64 {
    12
}

impl NetworkSpec {
    /// The endpoint the Resource Pool should dial first.
    #[must_use]
    pub fn primary_rpc(&self) -> Option<&str> {
        self.rpc_endpoints.first().map(String::as_str)
    }
}

/// Point-in-time liveness observation for a network, persisted by the Test
/// Runner and consumed by the dashboard (external, read-only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub network_id: String,
    pub chain_id: u64,
    pub block_number: u64,
    pub gas_price: Wei,
    pub response_time_ms: u64,
    pub online: bool,
    pub timestamp: DateTime<Utc>,
    pub rpc_url: String,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_config_fallback_matches_variant() {
        let fixed = GasConfig::Fixed {
            required_gwei: 5,
            tolerance_gwei: 1,
        };
        assert_eq!(fixed.fallback(), Wei::from_gwei(5));

        let dynamic = GasConfig::Dynamic {
            max_gas_price_gwei: Some(100),
            fallback_gwei: 20,
        };
        assert_eq!(dynamic.fallback(), Wei::from_gwei(20));
    }

    #[test]
    fn feature_set_reports_membership() {
        let mut set = FeatureSet::default();
        set.0.insert(Feature::Eip1559);
        assert!(set.has(Feature::Eip1559));
        assert!(!set.has(Feature::Create2));
    }
}
