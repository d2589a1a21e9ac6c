use std::fmt;

use serde::{Deserialize, Serialize};

/// A non-negative quantity of wei, the single numeric type used for every
/// on-chain value (gas prices, balances, costs) throughout the orchestrator.
///
/// Keeping one bounded-integer newtype instead of passing `u128`/`f64`
/// around everywhere is the schema-first replacement for the "numeric wei
/// values scattered as untyped numbers" pattern called out in the design
/// notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wei(pub u128);

impl Wei {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_gwei(gwei: u64) -> Self {
        Self(gwei as u128 * 1_000_000_000)
    }

    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }

    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    #[must_use]
    pub fn saturating_mul_f64(self, factor: f64) -> Self {
        if factor <= 0.0 {
            return Self::ZERO;
        }
        let scaled = (self.0 as f64) * factor;
        Self(scaled.round() as u128)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}

impl From<u64> for Wei {
    fn from(value: u64) -> Self {
        Self(u128::from(value))
    }
}

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Wei;

    #[test]
    fn from_gwei_scales_to_wei() {
        assert_eq!(Wei::from_gwei(1), Wei(1_000_000_000));
        assert_eq!(Wei::from_gwei(0), Wei::ZERO);
    }

    #[test]
    fn saturating_mul_rounds_and_floors_at_zero() {
        assert_eq!(Wei(100).saturating_mul_f64(1.5), Wei(150));
        assert_eq!(Wei(100).saturating_mul_f64(-2.0), Wei::ZERO);
    }

    #[test]
    fn saturating_add_never_overflows() {
        assert_eq!(Wei(u128::MAX).saturating_add(Wei(1)), Wei(u128::MAX));
    }
}
