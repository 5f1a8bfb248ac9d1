use std::{future::Future, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use tokio::runtime::Builder;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{api::ApiClient, error::ApiError, output::OutputFormat};

pub const DEFAULT_HOST: &str = "api.heimdahl.xyz";

/// Main entrypoint to `heimdahl`.
pub fn run() -> eyre::Result<()> {
    let config = Config::parse();
    init_tracing(config.verbose);
    config.command.run(&config.client)
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();
}

/// Runs `future` to completion on a fresh multi-threaded runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, std::io::Error> {
    let runtime = Builder::new_multi_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Config {
    #[clap(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub client: ClientConfig,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// How to reach the indexing API.
#[derive(Args, Debug, Clone)]
pub struct ClientConfig {
    /// Host of the API server, optionally with a scheme.
    #[arg(short = 'H', long, global = true, default_value = DEFAULT_HOST)]
    pub host: String,
    /// Use plain HTTP and WebSocket connections.
    #[arg(long, global = true)]
    pub insecure: bool,
    /// API key sent as a bearer token.
    #[arg(
        short = 'K',
        long,
        global = true,
        env = "HEIMDAHL_API_KEY",
        hide_env_values = true
    )]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            host: host.into(),
            insecure: false,
            api_key,
            timeout: crate::api::DEFAULT_TIMEOUT.as_secs(),
        }
    }

    /// `https://host`, or `http://host` when insecure. A host that already
    /// names its scheme is used as is.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            return host.to_owned();
        }

        let scheme = if self.insecure { "http" } else { "https" };
        format!("{scheme}://{host}")
    }

    /// Base URL of the streaming endpoints.
    pub fn ws_url(&self) -> String {
        let base = self.base_url();
        match base.split_once("://") {
            Some(("http", rest)) => format!("ws://{rest}"),
            Some((_, rest)) => format!("wss://{rest}"),
            None => base,
        }
    }

    pub fn api_key(&self) -> Result<&str, ApiError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ApiError::MissingApiKey)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn api(&self) -> Result<ApiClient, ApiError> {
        ApiClient::new(&self.base_url(), self.api_key()?, self.timeout())
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Configure and deploy Hardhat projects.
    #[command(subcommand)]
    Hardhat(HardhatCommands),
    /// Fungible token transfers.
    #[command(subcommand)]
    Transfers(TransferCommands),
    /// Token swaps.
    #[command(subcommand)]
    Swaps(SwapCommands),
    /// Decoded contract events.
    #[command(subcommand)]
    Events(EventCommands),
    /// Contracts tracked by the indexer.
    #[command(subcommand)]
    Contracts(ContractCommands),
    /// Supported chains.
    #[command(subcommand)]
    Chains(ChainCommands),
}

impl Commands {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        match self {
            Commands::Hardhat(HardhatCommands::Init(command)) => command.run(),
            Commands::Hardhat(HardhatCommands::Deploy(command)) => command.run(client),
            Commands::Transfers(TransferCommands::List(command)) => command.run(client),
            Commands::Transfers(TransferCommands::Subscribe(command)) => command.run(client),
            Commands::Swaps(SwapCommands::List(command)) => command.run(client),
            Commands::Events(EventCommands::List(command)) => command.run(client),
            Commands::Events(EventCommands::Listen(command)) => command.run(client),
            Commands::Events(EventCommands::CrossListen(command)) => command.run(client),
            Commands::Events(EventCommands::Replay(command)) => command.run(client),
            Commands::Contracts(ContractCommands::Add(command)) => command.run(client),
            Commands::Contracts(ContractCommands::List(command)) => command.run(client),
            Commands::Contracts(ContractCommands::Show(command)) => command.run(client),
            Commands::Chains(ChainCommands::Show(command)) => command.run(client),
        }
    }
}

#[derive(Debug, Subcommand)]
enum HardhatCommands {
    #[command(name = "init")]
    Init(Init),
    #[command(name = "deploy")]
    Deploy(Deploy),
}

#[derive(Debug, Subcommand)]
enum TransferCommands {
    #[command(name = "list")]
    List(TransfersList),
    #[command(name = "subscribe")]
    Subscribe(TransfersSubscribe),
}

#[derive(Debug, Subcommand)]
enum SwapCommands {
    #[command(name = "list")]
    List(SwapsList),
}

#[derive(Debug, Subcommand)]
enum EventCommands {
    #[command(name = "list")]
    List(EventsList),
    #[command(name = "listen")]
    Listen(EventsListen),
    #[command(name = "cross-listen")]
    CrossListen(EventsCrossListen),
    #[command(name = "replay")]
    Replay(EventsReplay),
}

#[derive(Debug, Subcommand)]
enum ContractCommands {
    #[command(name = "add")]
    Add(ContractsAdd),
    #[command(name = "list")]
    List(ContractsList),
    #[command(name = "show")]
    Show(ContractsShow),
}

#[derive(Debug, Subcommand)]
enum ChainCommands {
    #[command(name = "show")]
    Show(ChainsShow),
}

/// Write a `heimdahl.json` deployment config for a Hardhat project.
#[derive(Parser, Debug)]
pub struct Init {
    /// Hardhat project root.
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,
    /// Overwrite an existing config.
    #[arg(long)]
    pub force: bool,
}

/// Sign every compiled contract and submit the deployments.
#[derive(Parser, Debug)]
pub struct Deploy {
    /// Hardhat project root.
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,
    #[arg(long, default_value_t = 1_000_000)]
    pub gas_limit: u64,
    /// Gas price in wei.
    #[arg(long, default_value_t = 1_000_000_000)]
    pub gas_price: u128,
    /// Print the signed payloads instead of submitting them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct Pagination {
    /// Page to fetch, starting at 0.
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    /// Results per page.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..))]
    pub per_page: u32,
}

impl Pagination {
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("page", self.page.to_string()),
            ("pageSize", self.per_page.to_string()),
        ]
    }
}

/// List transfers matching a `chain.network.token.from.to` pattern.
#[derive(Parser, Debug)]
pub struct TransfersList {
    pub pattern: String,
    #[command(flatten)]
    pub pagination: Pagination,
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Stream transfers matching a pattern until interrupted.
#[derive(Parser, Debug)]
pub struct TransfersSubscribe {
    pub pattern: String,
}

/// List swaps matching a pattern.
#[derive(Parser, Debug)]
pub struct SwapsList {
    pub pattern: String,
    #[command(flatten)]
    pub pagination: Pagination,
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// List events matching a pattern.
#[derive(Parser, Debug)]
pub struct EventsList {
    pub pattern: String,
    #[command(flatten)]
    pub pagination: Pagination,
}

/// Stream one event of a contract, or of several contracts with
/// `--addresses`, until interrupted.
#[derive(Parser, Debug)]
pub struct EventsListen {
    #[arg(required_unless_present = "addresses")]
    pub chain: Option<String>,
    #[arg(required_unless_present = "addresses")]
    pub address: Option<String>,
    #[arg(required_unless_present = "addresses")]
    pub event: Option<String>,
    /// Comma-separated contract addresses to listen to at once.
    #[arg(
        short,
        long,
        value_delimiter = ',',
        conflicts_with_all = ["chain", "address", "event"]
    )]
    pub addresses: Vec<String>,
    /// Event to listen for with `--addresses`. Empty means every event.
    #[arg(short = 'e', long = "event", requires = "addresses")]
    pub event_filter: Option<String>,
}

/// Stream one contract event across several chains until interrupted.
#[derive(Parser, Debug)]
pub struct EventsCrossListen {
    /// Contract name.
    #[arg(short = 'a', long)]
    pub contract: String,
    #[arg(short, long)]
    pub event: String,
    /// Comma-separated chains.
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub chains: Vec<String>,
}

/// Fetch a page of past events of a contract.
#[derive(Parser, Debug)]
pub struct EventsReplay {
    #[arg(short, long)]
    pub address: String,
    /// Event to replay. Empty means every event.
    #[arg(short, long, default_value = "")]
    pub event: String,
    #[command(flatten)]
    pub pagination: Pagination,
}

/// Register a contract with the indexer.
#[derive(Parser, Debug)]
pub struct ContractsAdd {
    pub address: String,
    pub name: String,
    #[arg(short, long, default_value = "ethereum")]
    pub chain: String,
    #[arg(short, long, default_value = "mainnet")]
    pub network: String,
    #[arg(long, default_value = "")]
    pub project: String,
    /// Comma-separated event names to index.
    #[arg(short, long)]
    pub events: Option<String>,
    /// Raw JSON ABI.
    #[arg(long, conflicts_with = "abi_file")]
    pub abi: Option<String>,
    /// File holding the JSON ABI.
    #[arg(short = 'f', long)]
    pub abi_file: Option<PathBuf>,
}

/// List registered contracts.
#[derive(Parser, Debug)]
pub struct ContractsList {}

/// Show a registered contract.
#[derive(Parser, Debug)]
pub struct ContractsShow {
    #[arg(short, long)]
    pub address: String,
}

/// Show a chain's id.
#[derive(Parser, Debug)]
pub struct ChainsShow {
    #[arg(short, long)]
    pub chain: String,
    #[arg(short, long, default_value = "mainnet")]
    pub network: String,
}
