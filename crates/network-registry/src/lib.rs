//! Network Configuration Registry (component A).
//!
//! Loads a directory of declarative per-network documents, validates them,
//! expands `${VAR}` placeholders against the process environment, and
//! serves immutable snapshots indexed by `id` and `chainId`.

pub mod error;
pub mod registry;
pub mod template;
pub mod validation;

pub use error::{RegistryError, ValidationIssue};
pub use registry::NetworkRegistry;
