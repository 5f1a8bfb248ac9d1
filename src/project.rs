use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::json_abi::Param;
use eyre::{bail, eyre, WrapErr};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{artifacts, artifacts::ContractArtifact, config::Init, error::DeployError};

/// Project configuration file, at the root of a Hardhat project.
pub const CONFIG_FILE: &str = "heimdahl.json";
pub const KEY_PLACEHOLDER: &str = "--PLEASE ADD YOUR PRIVATE KEY HERE--";
pub const VALUE_PLACEHOLDER: &str = "-- PLEASE AMEND HERE ---";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project_name: String,
    #[serde(default)]
    pub networks: Vec<NetworkTarget>,
}

/// One chain/network pair to deploy every contract to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTarget {
    pub chain: String,
    pub network: String,
    pub chain_id: u64,
    pub private_key: String,
    #[serde(default)]
    pub contract_params: Vec<ContractParams>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractParams {
    pub contract_name: String,
    #[serde(default)]
    pub arguments: ConstructorArguments,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstructorArguments {
    #[serde(rename = "constructorArguments", default)]
    pub inputs: Vec<ConstructorArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorArgument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub value: Value,
    /// Members of a `tuple` argument.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ConstructorArgument>,
}

impl ProjectConfig {
    pub fn path(root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(CONFIG_FILE)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| DeployError::Io {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| DeployError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DeployError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| DeployError::Parse {
            path: path.to_owned(),
            source,
        })?;
        fs::write(path, json).map_err(|source| DeployError::Io {
            path: path.to_owned(),
            source,
        })
    }

    /// A starting configuration: one local network and a placeholder for
    /// every constructor input of every contract.
    pub fn template(project_name: &str, artifacts: &[ContractArtifact]) -> Self {
        let contract_params = artifacts
            .iter()
            .filter(|artifact| artifact.is_deployable())
            .map(|artifact| ContractParams {
                contract_name: artifact.contract_name.clone(),
                arguments: ConstructorArguments {
                    inputs: artifact
                        .abi
                        .constructor()
                        .map(|c| c.inputs.iter().map(placeholder).collect())
                        .unwrap_or_default(),
                },
            })
            .collect();

        Self {
            project_name: project_name.to_owned(),
            networks: vec![NetworkTarget {
                chain: "ethereum".to_owned(),
                network: "localnet".to_owned(),
                chain_id: 31337,
                private_key: KEY_PLACEHOLDER.to_owned(),
                contract_params,
            }],
        }
    }
}

fn placeholder(param: &Param) -> ConstructorArgument {
    let value = if param.components.is_empty() {
        Value::String(VALUE_PLACEHOLDER.to_owned())
    } else {
        Value::Null
    };

    ConstructorArgument {
        name: param.name.clone(),
        ty: param.ty.clone(),
        value,
        components: param.components.iter().map(placeholder).collect(),
    }
}

impl NetworkTarget {
    /// Arguments configured for `contract_name`; empty when none are.
    pub fn constructor_args(&self, contract_name: &str) -> &[ConstructorArgument] {
        self.contract_params
            .iter()
            .find(|params| params.contract_name == contract_name)
            .map(|params| params.arguments.inputs.as_slice())
            .unwrap_or_default()
    }
}

fn package_name(root: &Path) -> eyre::Result<String> {
    let path = root.join("package.json");
    let package = fs::read_to_string(&path)
        .wrap_err_with(|| eyre!("failed to read {}", path.display()))?;
    let package: Value = serde_json::from_str(&package)
        .wrap_err_with(|| eyre!("failed to parse {}", path.display()))?;

    package
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| eyre!("{} has no `name`", path.display()))
}

impl Init {
    pub fn run(&self) -> eyre::Result<()> {
        let path = ProjectConfig::path(&self.root);
        if path.exists() && !self.force {
            bail!(
                "{} already exists, pass --force to overwrite it",
                path.display()
            );
        }

        let project_name = package_name(&self.root)?;
        let artifacts =
            artifacts::read_artifacts(&self.root).wrap_err("failed to read contract artifacts")?;
        tracing::info!("found {} contract artifacts", artifacts.len());

        let config = ProjectConfig::template(&project_name, &artifacts);
        config.save(&path)?;

        println!("config created: {}", path.display().bright_magenta());
        println!(
            "fill in the {} and constructor arguments before deploying",
            "private key".yellow()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy::json_abi::JsonAbi;
    use serde_json::json;

    use crate::artifacts::ContractArtifact;

    use super::{ProjectConfig, KEY_PLACEHOLDER, VALUE_PLACEHOLDER};

    #[test]
    fn parses_project_file() {
        let config: ProjectConfig = serde_json::from_value(json!({
            "project_name": "demo",
            "networks": [{
                "chain": "ethereum",
                "network": "sepolia",
                "chain_id": 11155111,
                "private_key": "0x01",
                "contract_params": [{
                    "contract_name": "Token",
                    "arguments": {
                        "constructorArguments": [
                            { "name": "_supply", "type": "uint256", "value": 1000 },
                            {
                                "name": "_person",
                                "type": "tuple",
                                "components": [
                                    { "name": "name", "type": "string", "value": "Alice" }
                                ]
                            }
                        ]
                    }
                }]
            }]
        }))
        .unwrap();

        let network = &config.networks[0];
        assert_eq!(network.chain_id, 11155111);
        let args = network.constructor_args("Token");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].ty, "uint256");
        assert_eq!(args[1].components[0].value, json!("Alice"));
        assert!(network.constructor_args("Missing").is_empty());
    }

    #[test]
    fn builds_template_from_artifacts() {
        let abi: JsonAbi = serde_json::from_value(json!([{
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "_owner", "type": "address", "internalType": "address" },
                {
                    "name": "_pair",
                    "type": "tuple",
                    "internalType": "struct Vault.Pair",
                    "components": [
                        { "name": "a", "type": "uint256", "internalType": "uint256" }
                    ]
                }
            ]
        }]))
        .unwrap();
        let artifacts = [
            ContractArtifact {
                contract_name: "Vault".to_owned(),
                source_name: "contracts/Vault.sol".to_owned(),
                abi,
                bytecode: "0x00".to_owned(),
            },
            ContractArtifact {
                contract_name: "Lock".to_owned(),
                source_name: "contracts/Lock.sol".to_owned(),
                abi: JsonAbi::default(),
                bytecode: "0x00".to_owned(),
            },
            ContractArtifact {
                contract_name: "IVault".to_owned(),
                source_name: "contracts/IVault.sol".to_owned(),
                abi: JsonAbi::default(),
                bytecode: "0x".to_owned(),
            },
        ];

        let config = ProjectConfig::template("demo", &artifacts);
        assert_eq!(config.project_name, "demo");
        let network = &config.networks[0];
        assert_eq!(network.chain_id, 31337);
        assert_eq!(network.private_key, KEY_PLACEHOLDER);

        let vault = network.constructor_args("Vault");
        assert_eq!(vault[0].value, json!(VALUE_PLACEHOLDER));
        assert_eq!(vault[1].ty, "tuple");
        assert_eq!(vault[1].components[0].name, "a");
        assert!(network.constructor_args("Lock").is_empty());
        let names: Vec<_> = network
            .contract_params
            .iter()
            .map(|p| p.contract_name.as_str())
            .collect();
        assert_eq!(names, ["Vault", "Lock"]);
    }

    #[test]
    fn saves_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = ProjectConfig::path(dir.path());
        let config = ProjectConfig::template("demo", &[]);
        config.save(&path).unwrap();
        assert_eq!(ProjectConfig::load(&path).unwrap(), config);
    }
}
