use std::collections::{BTreeMap, HashMap};

use alloy::primitives::Address;
use eyre::{bail, WrapErr};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::{
    api::ApiClient,
    arguments::encode_constructor_args,
    artifacts::{self, ContractArtifact},
    config::{self, ClientConfig, Deploy},
    error::DeployError,
    formatting::{format_code_size, format_gas},
    project::{NetworkTarget, ProjectConfig},
    transaction::{sign_deployment, DeploymentTx},
    wallet,
};

/// A signed contract creation, ready to be relayed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentPayload {
    pub contract_name: String,
    pub transaction_hex: String,
    pub chain: String,
    pub network: String,
}

#[derive(Debug, Clone, Copy)]
pub struct GasSettings {
    pub gas_limit: u64,
    pub gas_price: u128,
}

pub type Batches = BTreeMap<Address, Vec<DeploymentPayload>>;

/// Init code followed by the ABI-encoded constructor arguments, as hex.
pub fn deployment_code(
    artifact: &ContractArtifact,
    target: &NetworkTarget,
) -> Result<String, DeployError> {
    let bytecode = artifact.bytecode.trim();
    let bytecode = bytecode.strip_prefix("0x").unwrap_or(bytecode);
    let args = target.constructor_args(&artifact.contract_name);
    let encoded = encode_constructor_args(&artifact.contract_name, &artifact.abi, args)?;

    Ok(format!("{bytecode}{}", hex::encode(encoded)))
}

/// Signs one deployment per contract for `target`, starting at `start_nonce`.
///
/// The n-th signed payload carries `start_nonce + n`. Contracts without init
/// code are skipped and don't consume a nonce.
pub fn build_payloads(
    artifacts: &[ContractArtifact],
    target: &NetworkTarget,
    start_nonce: u64,
    gas: GasSettings,
) -> Result<Vec<DeploymentPayload>, DeployError> {
    let mut nonce = start_nonce;
    let mut payloads = Vec::new();

    for artifact in artifacts {
        if !artifact.is_deployable() {
            tracing::info!("skipping {}: no bytecode", artifact.contract_name);
            continue;
        }

        let code = deployment_code(artifact, target)?;
        let transaction_hex = sign_deployment(&DeploymentTx {
            bytecode: &code,
            chain_id: target.chain_id,
            private_key: &target.private_key,
            gas_limit: gas.gas_limit,
            gas_price: gas.gas_price,
            nonce,
        })?;
        tracing::debug!(
            "signed {} for {}.{} with nonce {nonce}",
            artifact.contract_name,
            target.chain,
            target.network
        );

        payloads.push(DeploymentPayload {
            contract_name: artifact.contract_name.clone(),
            transaction_hex,
            chain: target.chain.clone(),
            network: target.network.clone(),
        });
        nonce += 1;
    }

    Ok(payloads)
}

/// Key of `address`' nonce on a chain in the nonce endpoint's answer.
pub fn nonce_key(address: &Address, chain: &str, network: &str) -> String {
    format!("{address}.{chain}.{network}")
}

/// Next nonce of `address` on the target's chain. Accounts the API has never
/// seen start at zero.
pub async fn fetch_nonce(
    api: &ApiClient,
    address: &Address,
    target: &NetworkTarget,
) -> Result<u64, DeployError> {
    let response = api
        .nonces(&address.to_string())
        .await
        .map_err(|source| DeployError::NonceFetch {
            address: address.to_string(),
            source,
        })?;

    let key = nonce_key(address, &target.chain, &target.network);
    Ok(response.nonces.get(&key).copied().unwrap_or_default())
}

/// Signs every deployable contract for every target, grouped by sender.
///
/// Targets are handled one after the other. The nonce of an (address, chain,
/// network) triple is fetched once per run; targets repeating a triple
/// continue where the previous one stopped.
pub async fn assemble(
    api: &ApiClient,
    artifacts: &[ContractArtifact],
    targets: &[NetworkTarget],
    gas: GasSettings,
) -> Result<Batches, DeployError> {
    let mut batches = Batches::new();
    let mut next_nonces: HashMap<(Address, String, String), u64> = HashMap::new();

    for target in targets {
        let address = wallet::sender_address(&target.private_key)?;
        let key = (address, target.chain.clone(), target.network.clone());
        let nonce = match next_nonces.get(&key) {
            Some(nonce) => *nonce,
            None => {
                let nonce = fetch_nonce(api, &address, target).await?;
                tracing::info!(
                    "{address} on {}.{} starts at nonce {nonce}",
                    target.chain,
                    target.network
                );
                nonce
            }
        };

        let payloads = build_payloads(artifacts, target, nonce, gas)?;
        next_nonces.insert(key, nonce + payloads.len() as u64);
        batches.entry(address).or_default().extend(payloads);
    }

    Ok(batches)
}

/// Submits each sender's batch. A failed batch doesn't stop the others.
pub async fn submit(
    api: &ApiClient,
    batches: &Batches,
) -> Vec<(Address, Result<String, DeployError>)> {
    let mut results = Vec::with_capacity(batches.len());

    for (address, payloads) in batches {
        if payloads.is_empty() {
            continue;
        }

        let result = api
            .deploy_contracts(payloads)
            .await
            .map_err(|source| DeployError::Submission {
                address: address.to_string(),
                source,
            });
        results.push((*address, result));
    }

    results
}

impl Deploy {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        config::block_on(self.deploy(client))?
    }

    async fn deploy(&self, client: &ClientConfig) -> eyre::Result<()> {
        let path = ProjectConfig::path(&self.root);
        let project = ProjectConfig::load(&path).wrap_err("failed to read project config")?;
        let artifacts =
            artifacts::read_artifacts(&self.root).wrap_err("failed to read contract artifacts")?;

        for artifact in &artifacts {
            if !artifact.is_deployable() {
                println!(
                    "{}: {}",
                    artifact.qualified_name(),
                    "no bytecode, skipped".yellow()
                );
                continue;
            }
            let len = artifact.bytecode.trim_start_matches("0x").len() / 2;
            println!(
                "{}: init code size: {}",
                artifact.qualified_name(),
                format_code_size(len)
            );
        }
        println!("gas limit: {}", format_gas(self.gas_limit));

        let api = client.api()?;
        let gas = GasSettings {
            gas_limit: self.gas_limit,
            gas_price: self.gas_price,
        };
        let batches = assemble(&api, &artifacts, &project.networks, gas)
            .await
            .wrap_err("failed to assemble deployments")?;

        if self.dry_run {
            let batches: BTreeMap<String, &Vec<DeploymentPayload>> = batches
                .iter()
                .map(|(address, payloads)| (address.to_string(), payloads))
                .collect();
            println!("{}", serde_json::to_string_pretty(&batches)?);
            return Ok(());
        }

        println!("deploying through: {}", api.base_url().bright_magenta());
        let results = submit(&api, &batches).await;
        let total = results.len();
        let mut failed = 0;
        for (address, result) in results {
            match result {
                Ok(body) => {
                    println!("{}: {}", address.bright_purple(), "submitted".bright_green());
                    tracing::debug!("response: {body}");
                }
                Err(e) => {
                    failed += 1;
                    eprintln!("{}: {}", address.bright_purple(), e.red());
                }
            }
        }

        if failed > 0 {
            bail!("{failed} of {total} deployment batches failed");
        }
        Ok(())
    }
}
