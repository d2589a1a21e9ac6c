use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use orchestrator_types::{NetworkSpec, NetworkType};
use tracing::{debug, warn};

use crate::{error::RegistryError, template, validation};

const SCHEMA_FILE_STEM: &str = "schema";

/// Immutable, atomically-swappable view over every loaded network.
#[derive(Debug, Default)]
struct Snapshot {
    by_id: HashMap<String, Arc<NetworkSpec>>,
    by_chain_id: HashMap<u64, Arc<NetworkSpec>>,
}

impl Snapshot {
    /// Folds in every successfully-loaded spec, skipping (and logging) one
    /// whose `id` or `chainId` duplicates a spec already folded in, rather
    /// than failing the whole directory over one bad file.
    fn build(specs: Vec<NetworkSpec>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_chain_id: HashMap<u64, Arc<NetworkSpec>> = HashMap::new();

        for spec in specs {
            if by_id.contains_key(&spec.id) {
                warn!(id = %spec.id, "skipping network spec: duplicate id");
                continue;
            }
            if let Some(existing) = by_chain_id.get(&spec.chain_id) {
                warn!(
                    id = %spec.id,
                    chain_id = spec.chain_id,
                    first = %existing.id,
                    "skipping network spec: duplicate chain id"
                );
                continue;
            }
            let spec = Arc::new(spec);
            by_chain_id.insert(spec.chain_id, Arc::clone(&spec));
            by_id.insert(spec.id.clone(), spec);
        }

        Self { by_id, by_chain_id }
    }
}

/// Loads declarative per-network documents from a directory, validates and
/// template-expands them, and serves immutable snapshots indexed by `id`
/// and `chainId`.
///
/// `refresh()` rebuilds the whole snapshot and swaps it in atomically: a
/// reader either observes the entirely-old or entirely-new map, never a
/// partial one.
pub struct NetworkRegistry {
    directory: PathBuf,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl NetworkRegistry {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Reads every network-spec file in the directory, skipping (and
    /// logging) any file that fails to parse, fails schema validation, or
    /// has no usable endpoint left after template expansion. Returns the
    /// number of networks successfully loaded.
    pub fn load_all(&self) -> Result<usize, RegistryError> {
        let specs = self.read_directory()?;
        let snapshot = Snapshot::build(specs);
        let count = snapshot.by_id.len();
        *self.snapshot.write().expect("registry lock poisoned") = Arc::new(snapshot);
        Ok(count)
    }

    /// Alias for `load_all`, used when the caller wants to make clear it is
    /// re-reading the directory rather than loading for the first time.
    pub fn refresh(&self) -> Result<usize, RegistryError> {
        self.load_all()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<NetworkSpec>> {
        self.current().by_id.get(id).cloned()
    }

    #[must_use]
    pub fn get_by_chain_id(&self, chain_id: u64) -> Option<Arc<NetworkSpec>> {
        self.current().by_chain_id.get(&chain_id).cloned()
    }

    #[must_use]
    pub fn all(&self) -> Vec<Arc<NetworkSpec>> {
        self.current().by_id.values().cloned().collect()
    }

    #[must_use]
    pub fn by_type(&self, network_type: NetworkType) -> Vec<Arc<NetworkSpec>> {
        self.current()
            .by_id
            .values()
            .filter(|spec| spec.network_type == network_type)
            .cloned()
            .collect()
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().expect("registry lock poisoned"))
    }

    fn read_directory(&self) -> Result<Vec<NetworkSpec>, RegistryError> {
        let entries = fs::read_dir(&self.directory).map_err(|source| RegistryError::Io {
            path: self.directory.display().to_string(),
            source,
        })?;

        let mut specs = Vec::new();
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if !is_candidate_file(&path) {
                continue;
            }
            match load_one(&path) {
                Ok(spec) => specs.push(spec),
                Err(error) => {
                    warn!(file = %path.display(), %error, "skipping invalid network spec");
                }
            }
        }
        Ok(specs)
    }
}

fn is_candidate_file(path: &Path) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    );
    is_yaml && stem != SCHEMA_FILE_STEM
}

/// Parses, expands and validates one network-spec file.
fn load_one(path: &Path) -> Result<NetworkSpec, RegistryError> {
    let file_label = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: file_label.clone(),
        source,
    })?;

    let deserializer = serde_yaml::Deserializer::from_str(&contents);
    let mut spec: NetworkSpec =
        serde_path_to_error::deserialize(deserializer).map_err(|source| {
            RegistryError::InvalidSchema {
                file: file_label.clone(),
                issues: vec![crate::error::ValidationIssue {
                    path: source.path().to_string(),
                    message: source.into_inner().to_string(),
                }],
            }
        })?;

    expand_endpoints(&mut spec);

    if spec.rpc_endpoints.is_empty() {
        return Err(RegistryError::NoUsableEndpoint {
            id: spec.id,
            chain_id: spec.chain_id,
        });
    }

    let issues = validation::validate(&spec);
    if !issues.is_empty() {
        return Err(RegistryError::InvalidSchema {
            file: file_label,
            issues,
        });
    }

    debug!(id = %spec.id, chain_id = spec.chain_id, "loaded network spec");
    Ok(spec)
}

/// Expands `${VAR}` placeholders in every RPC/WS URL, dropping any URL
/// whose placeholder has no matching environment variable rather than
/// leaving it unresolved.
fn expand_endpoints(spec: &mut NetworkSpec) {
    spec.rpc_endpoints.retain_mut(|url| match template::expand(url) {
        Some(expanded) => {
            *url = expanded;
            true
        }
        None => false,
    });
    spec.ws_endpoints.retain_mut(|url| match template::expand(url) {
        Some(expanded) => {
            *url = expanded;
            true
        }
        None => false,
    });
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    const VALID_SPEC: &str = r"
id: sepolia
name: Sepolia
chainId: 11155111
symbol: ETH
type: testnet
rpcEndpoints:
  - https://rpc.sepolia.org
gasConfig:
  strategy: fixed
  requiredGwei: 5
  toleranceGwei: 1
timeouts:
  sendMs: 1000
  receiptMs: 30000
  deploymentMs: 60000
  confirmationMs: 30000
";

    #[test]
    fn load_all_indexes_by_id_and_chain_id() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sepolia.yaml"), VALID_SPEC).unwrap();
        fs::write(dir.path().join("schema.yaml"), "ignored: true").unwrap();

        let registry = NetworkRegistry::new(dir.path());
        let loaded = registry.load_all().unwrap();
        assert_eq!(loaded, 1);
        assert!(registry.get("sepolia").is_some());
        assert!(registry.get_by_chain_id(11_155_111).is_some());
    }

    #[test]
    fn invalid_file_is_skipped_others_continue() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sepolia.yaml"), VALID_SPEC).unwrap();
        fs::write(dir.path().join("broken.yaml"), "id: [this is not valid").unwrap();

        let registry = NetworkRegistry::new(dir.path());
        let loaded = registry.load_all().unwrap();
        assert_eq!(loaded, 1);
    }

    #[test]
    fn refresh_after_no_op_change_yields_equal_snapshot() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sepolia.yaml"), VALID_SPEC).unwrap();

        let registry = NetworkRegistry::new(dir.path());
        registry.load_all().unwrap();
        let before = registry.get("sepolia").unwrap();
        registry.refresh().unwrap();
        let after = registry.get("sepolia").unwrap();
        assert_eq!(*before, *after);
    }

    #[test]
    fn duplicate_chain_id_is_skipped_others_continue() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sepolia.yaml"), VALID_SPEC).unwrap();
        let duplicate = VALID_SPEC.replace("id: sepolia", "id: sepolia-clone");
        fs::write(dir.path().join("sepolia-clone.yaml"), duplicate).unwrap();
        let other = VALID_SPEC
            .replace("id: sepolia", "id: holesky")
            .replace("chainId: 11155111", "chainId: 17000");
        fs::write(dir.path().join("holesky.yaml"), other).unwrap();

        let registry = NetworkRegistry::new(dir.path());
        let loaded = registry.load_all().unwrap();
        assert_eq!(loaded, 2);
        assert!(registry.get("holesky").is_some());
        assert_ne!(registry.get("sepolia").is_some(), registry.get("sepolia-clone").is_some());
    }
}
