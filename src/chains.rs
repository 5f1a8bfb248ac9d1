use eyre::WrapErr;
use owo_colors::OwoColorize;

use crate::{
    api::NO_QUERY,
    config::{self, ChainsShow, ClientConfig},
    models::ChainInfo,
};

impl ChainsShow {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        config::block_on(self.show(client))?
    }

    async fn show(&self, client: &ClientConfig) -> eyre::Result<()> {
        let api = client.api()?;
        let path = format!("/v1/chains/{}/{}", self.chain, self.network);
        let chain: ChainInfo = api
            .get_json(&path, NO_QUERY)
            .await
            .wrap_err_with(|| format!("failed to fetch chain {}.{}", self.chain, self.network))?;

        println!("Chain: {}", chain.chain_name);
        println!("Network: {}", chain.chain_network);
        println!("Chain ID: {}", chain.chain_id.bright_magenta());
        Ok(())
    }
}
