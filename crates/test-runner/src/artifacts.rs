use std::path::{Path, PathBuf};

use crate::error::OpError;

/// Consumed `{abi, bytecode}` pair for a contract to deploy.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub abi: serde_json::Value,
    pub bytecode: String,
}

/// Resolves an artifact for `name`: an explicit path, then three
/// conventional build-output locations, in order. Fails with a
/// configuration-category error (never retried) if none exist or the
/// bytecode is the empty placeholder `0x`.
pub fn resolve(base_dir: &Path, name: &str, explicit: Option<&Path>) -> Result<Artifact, OpError> {
    let candidates: Vec<PathBuf> = explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain([
            base_dir.join("artifacts/contracts").join(format!("{name}.sol")).join(format!("{name}.json")),
            base_dir.join("contracts").join(format!("{name}.json")),
            base_dir.join("build/contracts").join(format!("{name}.json")),
        ])
        .collect();

    for candidate in &candidates {
        if let Ok(contents) = std::fs::read_to_string(candidate) {
            return parse(&contents, name);
        }
    }

    Err(OpError::configuration(format!(
        "no artifact found for {name} in any of {} candidate locations",
        candidates.len()
    )))
}

fn parse(contents: &str, name: &str) -> Result<Artifact, OpError> {
    let value: serde_json::Value = serde_json::from_str(contents)
        .map_err(|error| OpError::configuration(format!("{name} artifact is not valid json: {error}")))?;

    let abi = value.get("abi").cloned().unwrap_or(serde_json::json!([]));
    let bytecode = value
        .get("bytecode")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| OpError::configuration(format!("{name} artifact has no bytecode field")))?
        .to_string();

    if bytecode == "0x" {
        return Err(OpError::configuration(format!("{name} artifact bytecode is empty (0x)")));
    }

    Ok(Artifact { abi, bytecode })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn falls_back_through_conventional_locations() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("build/contracts");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("TokenA.json"), r#"{"abi": [], "bytecode": "0x600160"}"#).unwrap();

        let artifact = resolve(dir.path(), "TokenA", None).unwrap();
        assert_eq!(artifact.bytecode, "0x600160");
    }

    #[test]
    fn empty_bytecode_placeholder_is_rejected() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("contracts");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("Empty.json"), r#"{"abi": [], "bytecode": "0x"}"#).unwrap();

        let error = resolve(dir.path(), "Empty", None).unwrap_err();
        assert_eq!(error.category, orchestrator_types::ErrorCategory::Unknown);
    }

    #[test]
    fn missing_artifact_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let error = resolve(dir.path(), "Nowhere", None).unwrap_err();
        assert!(error.message.contains("Nowhere"));
    }
}
