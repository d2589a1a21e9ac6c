//! Domain types shared by every orchestrator crate.
//!
//! Nothing in this crate talks to the network or to disk; it exists so that
//! the network registry, the gas strategy manager, the resource pool, the
//! result store and the test runner all agree on one vocabulary instead of
//! each defining their own copy (the source accident called out for
//! re-architecture in the governing design notes).

pub mod alert;
pub mod contract;
pub mod gas;
pub mod ids;
pub mod metric;
pub mod network;
pub mod run;
pub mod wei;

pub use alert::{Alert, AlertSeverity};
pub use contract::{ContractDeployment, ContractType, HealthCheck, HealthStatus};
pub use gas::{GasQuote, GasSource};
pub use ids::{DeploymentId, HealthCheckId, RunId};
pub use metric::PerformanceMetric;
pub use network::{FeatureSet, GasConfig, NetworkSpec, NetworkStatus, NetworkType, Timeouts};
pub use run::{ErrorCategory, NetworkResult, RunMode, TestResult, TestRun, TestType, Totals};
pub use wei::Wei;
