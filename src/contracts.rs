use std::{
    fs,
    io::{self, Write},
};

use eyre::{eyre, WrapErr};
use owo_colors::OwoColorize;
use reqwest::StatusCode;

use crate::{
    api::{ApiClient, NO_QUERY},
    artifacts::parse_abi,
    config::{self, ClientConfig, ContractsAdd, ContractsList, ContractsShow},
    error::ApiError,
    models::{ContractInfo, NewContract},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    AlreadyPresent,
}

pub async fn register(api: &ApiClient, contract: &NewContract) -> Result<Registration, ApiError> {
    let (status, _) = api.post_json("/v1/contracts", contract).await?;
    Ok(if status == StatusCode::CREATED {
        Registration::Created
    } else {
        Registration::AlreadyPresent
    })
}

pub fn render_list(out: &mut impl Write, contracts: &[ContractInfo]) -> io::Result<()> {
    for contract in contracts {
        writeln!(out, "Chain:            {}", contract.chain)?;
        writeln!(out, "Network:          {}", contract.network)?;
        writeln!(out, "Contract Name:    {}", contract.contract_name)?;
        writeln!(out, "Contract Address: {}", contract.contract_address)?;
        writeln!(out, "Events:")?;
        for event in contract.events.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            writeln!(out, "  - {event}")?;
        }
        writeln!(out, "{}", "-".repeat(80))?;
    }
    writeln!(out)
}

impl ContractsAdd {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        config::block_on(self.add(client))?
    }

    /// The ABI to send, checked to be well formed.
    fn raw_abi(&self) -> eyre::Result<Option<String>> {
        let raw = match (&self.abi, &self.abi_file) {
            (_, Some(path)) => fs::read_to_string(path)
                .wrap_err_with(|| eyre!("failed to read ABI file {}", path.display()))?,
            (Some(raw), None) => raw.clone(),
            (None, None) => return Ok(None),
        };

        let value = serde_json::from_str(&raw).wrap_err("ABI is not valid JSON")?;
        parse_abi(value).map_err(|reason| eyre!("invalid ABI: {reason}"))?;
        Ok(Some(raw))
    }

    async fn add(&self, client: &ClientConfig) -> eyre::Result<()> {
        let contract = NewContract {
            project_name: self.project.clone(),
            chain: self.chain.clone(),
            network: self.network.clone(),
            contract_address: self.address.clone(),
            contract_name: self.name.clone(),
            event_names: self.events.clone().filter(|e| !e.trim().is_empty()),
            raw_abi: self.raw_abi()?,
        };

        let api = client.api()?;
        match register(&api, &contract)
            .await
            .wrap_err("failed to add contract")?
        {
            Registration::Created => {
                println!("{} {}", "successfully added contract".bright_green(), self.address)
            }
            Registration::AlreadyPresent => {
                println!("{} {}", "contract already added".yellow(), self.address)
            }
        }
        Ok(())
    }
}

impl ContractsList {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        config::block_on(self.list(client))?
    }

    async fn list(&self, client: &ClientConfig) -> eyre::Result<()> {
        let api = client.api()?;
        let contracts: Vec<ContractInfo> = api
            .get_json("/v1/contracts", NO_QUERY)
            .await
            .wrap_err("failed to list contracts")?;

        render_list(&mut io::stdout().lock(), &contracts)?;
        Ok(())
    }
}

impl ContractsShow {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        config::block_on(self.show(client))?
    }

    async fn show(&self, client: &ClientConfig) -> eyre::Result<()> {
        let api = client.api()?;
        let path = format!("/v1/contracts/{}", self.address);
        let contract: ContractInfo = api
            .get_json(&path, NO_QUERY)
            .await
            .wrap_err("failed to fetch contract")?;

        println!("Chain: {}", contract.chain);
        println!("Network: {}", contract.network);
        println!("Contract Name: {}", contract.contract_name);
        println!("Contract Address: {}", contract.contract_address);
        Ok(())
    }
}
