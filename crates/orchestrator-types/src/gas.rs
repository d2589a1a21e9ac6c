use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wei::Wei;

/// Where a `GasQuote`'s value came from. The Runner and Analytics layer use
/// this to distinguish "we trusted the network" from "we fell back".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GasSource {
    Fixed,
    Adaptive,
    Dynamic,
    Fallback,
    Cap,
    AggressiveOverride,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasQuote {
    pub gas_price: Wei,
    pub source: GasSource,
    pub observed_at: DateTime<Utc>,
}
