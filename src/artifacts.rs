use std::{fs, path::Path};

use alloy::{dyn_abi::Specifier, json_abi::JsonAbi};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::DeployError;

/// Where Hardhat puts compiled contracts, relative to the project root.
pub const ARTIFACTS_DIR: &str = "artifacts/contracts";
const DEBUG_SUFFIX: &str = ".dbg.json";

/// A compiled contract, as emitted by Hardhat.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: JsonAbi,
    /// Init code, `0x` prefixed.
    pub bytecode: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: String,
    #[serde(default)]
    source_name: String,
    abi: serde_json::Value,
    bytecode: String,
}

impl ContractArtifact {
    /// True for interfaces and abstract contracts, which have no init code.
    pub fn is_deployable(&self) -> bool {
        let code = self.bytecode.trim();
        !code.strip_prefix("0x").unwrap_or(code).is_empty()
    }

    /// `contracts/Lock.sol:Lock`, or the bare name when the source is unknown.
    pub fn qualified_name(&self) -> String {
        if self.source_name.is_empty() {
            self.contract_name.clone()
        } else {
            format!("{}:{}", self.source_name, self.contract_name)
        }
    }
}

/// Reads every contract artifact under `root/artifacts/contracts`.
///
/// Files are visited in file-name order, which fixes the deployment order of
/// the contracts. Debug files (`*.dbg.json`) are skipped. The first file that
/// can't be read or parsed aborts the whole read.
pub fn read_artifacts(root: impl AsRef<Path>) -> Result<Vec<ContractArtifact>, DeployError> {
    let dir = root.as_ref().join(ARTIFACTS_DIR);
    let mut artifacts = Vec::new();

    for entry in WalkDir::new(&dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir.as_path()).to_owned();
            DeployError::Io {
                path,
                source: e.into(),
            }
        })?;

        let name = entry.file_name().to_string_lossy();
        if !entry.file_type().is_file() || !name.ends_with(".json") || name.contains(DEBUG_SUFFIX)
        {
            continue;
        }

        tracing::debug!("reading artifact {}", entry.path().display());
        artifacts.push(read_artifact(entry.path())?);
    }

    Ok(artifacts)
}

/// Reads a single artifact file.
pub fn read_artifact(path: &Path) -> Result<ContractArtifact, DeployError> {
    let bytes = fs::read(path).map_err(|source| DeployError::Io {
        path: path.to_owned(),
        source,
    })?;
    let raw: RawArtifact = serde_json::from_slice(&bytes).map_err(|source| DeployError::Parse {
        path: path.to_owned(),
        source,
    })?;
    let abi = parse_abi(raw.abi).map_err(|reason| DeployError::Abi {
        path: path.to_owned(),
        reason,
    })?;

    Ok(ContractArtifact {
        contract_name: raw.contract_name,
        source_name: raw.source_name,
        abi,
        bytecode: raw.bytecode,
    })
}

/// Decodes a JSON ABI and checks that every constructor and function
/// parameter has a valid type.
pub fn parse_abi(abi: serde_json::Value) -> Result<JsonAbi, String> {
    let abi: JsonAbi = serde_json::from_value(abi).map_err(|e| e.to_string())?;

    let constructor = abi.constructor().into_iter().flat_map(|c| c.inputs.iter());
    let functions = abi
        .functions()
        .flat_map(|f| f.inputs.iter().chain(f.outputs.iter()));
    for param in constructor.chain(functions) {
        param
            .resolve()
            .map_err(|e| format!("parameter `{}` has invalid type `{}`: {e}", param.name, param.ty))?;
    }

    Ok(abi)
}
