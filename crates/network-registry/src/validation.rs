use orchestrator_types::{GasConfig, NetworkSpec};

use crate::error::ValidationIssue;

/// Structural checks beyond what serde already enforces (required fields,
/// `chainId` type): `chainId` must be positive, `type` must be one of the
/// three known kinds (serde already rejects anything else), and at least
/// one RPC endpoint must remain.
#[must_use]
pub fn validate(spec: &NetworkSpec) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if spec.id.trim().is_empty() {
        issues.push(ValidationIssue {
            path: "id".into(),
            message: "must not be empty".into(),
        });
    }
    if spec.id != spec.id.to_lowercase() {
        issues.push(ValidationIssue {
            path: "id".into(),
            message: "must be lowercase".into(),
        });
    }
    if spec.chain_id == 0 {
        issues.push(ValidationIssue {
            path: "chainId".into(),
            message: "must be a positive integer".into(),
        });
    }
    if spec.rpc_endpoints.is_empty() {
        issues.push(ValidationIssue {
            path: "rpc.public".into(),
            message: "must contain at least one endpoint".into(),
        });
    }

    match &spec.gas_config {
        GasConfig::Fixed { required_gwei, .. } if *required_gwei == 0 => {
            issues.push(ValidationIssue {
                path: "gasConfig.required".into(),
                message: "fixed strategy requires a non-zero gas price".into(),
            });
        }
        GasConfig::Dynamic {
            max_gas_price_gwei: Some(cap),
            fallback_gwei,
        } if *cap > 0 && *fallback_gwei > *cap => {
            issues.push(ValidationIssue {
                path: "gasConfig.fallback".into(),
                message: "fallback price exceeds configured cap".into(),
            });
        }
        _ => {}
    }

    issues
}

#[cfg(test)]
mod tests {
    use orchestrator_types::{FeatureSet, NetworkType, Timeouts};

    use super::*;

    fn minimal_spec() -> NetworkSpec {
        NetworkSpec {
            id: "sepolia".into(),
            name: "Sepolia".into(),
            chain_id: 11_155_111,
            symbol: "ETH".into(),
            network_type: NetworkType::Testnet,
            rpc_endpoints: vec!["https://rpc.sepolia.org".into()],
            ws_endpoints: vec![],
            explorer: None,
            faucet: None,
            gas_config: GasConfig::Fixed {
                required_gwei: 5,
                tolerance_gwei: 1,
            },
            mainnet_gas_price_gwei: None,
            timeouts: Timeouts {
                send_ms: 1_000,
                receipt_ms: 30_000,
                deployment_ms: 60_000,
                confirmation_ms: 30_000,
            },
            features: FeatureSet::default(),
            finality_blocks: 12,
        }
    }

    #[test]
    fn well_formed_spec_has_no_issues() {
        assert!(validate(&minimal_spec()).is_empty());
    }

    #[test]
    fn zero_chain_id_is_rejected() {
        let mut spec = minimal_spec();
        spec.chain_id = 0;
        let issues = validate(&spec);
        assert!(issues.iter().any(|i| i.path == "chainId"));
    }

    #[test]
    fn empty_endpoints_is_rejected() {
        let mut spec = minimal_spec();
        spec.rpc_endpoints.clear();
        let issues = validate(&spec);
        assert!(issues.iter().any(|i| i.path == "rpc.public"));
    }

    #[test]
    fn fallback_above_cap_is_rejected() {
        let mut spec = minimal_spec();
        spec.gas_config = GasConfig::Dynamic {
            max_gas_price_gwei: Some(10),
            fallback_gwei: 20,
        };
        let issues = validate(&spec);
        assert!(issues.iter().any(|i| i.path == "gasConfig.fallback"));
    }
}
