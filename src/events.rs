use std::io::{self, Write};

use eyre::{bail, WrapErr};
use serde_json::{Map, Value};

use crate::{
    api::ApiClient,
    config::{
        self, ClientConfig, EventsCrossListen, EventsList, EventsListen, EventsReplay, Pagination,
    },
    error::ApiError,
    formatting::format_timestamp,
    models::EventPage,
    stream,
};

/// Fields every streamed event carries besides its decoded parameters.
const META_FIELDS: [&str; 9] = [
    "chain",
    "network",
    "blockNumber",
    "blockHash",
    "blockTimestamp",
    "contractAddress",
    "timestamp",
    "transactionHash",
    "transactionIndex",
];

const SEPARATOR_WIDTH: usize = 75;

/// Strings without their quotes, everything else as JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn sorted(event: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut fields: Vec<_> = event.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    fields
}

pub fn render_page(out: &mut impl Write, page: &EventPage) -> io::Result<()> {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let meta = &page.meta;

    writeln!(out, "{separator}")?;
    writeln!(out, "META")?;
    writeln!(out, "{separator}")?;
    writeln!(out, "Chain     : {}", meta.chain)?;
    writeln!(out, "Address   : {}", meta.address)?;
    writeln!(out, "Event     : {}", meta.event)?;
    if let Some(timestamp) = page.events.first().and_then(|e| e.get("blockTimestamp")) {
        writeln!(out, "Timestamp : {}", display(timestamp))?;
    }
    writeln!(out, "Page      : {}", meta.page + 1)?;
    writeln!(out, "Per Page  : {}", meta.per_page)?;
    writeln!(out, "Total     : {}", meta.total)?;

    if page.events.is_empty() {
        writeln!(out, "{separator}")?;
        return writeln!(out, "No events found.");
    }

    for event in &page.events {
        writeln!(out, "{separator}")?;
        for (key, value) in sorted(event) {
            writeln!(out, "{key:<10}: {}", display(value))?;
        }
    }
    writeln!(out, "{separator}")
}

/// Fields of a replayed event shown in their own columns.
const REPLAY_FIELDS: [&str; 6] = [
    "blockNumber",
    "blockHash",
    "blockTimestamp",
    "timestamp",
    "transactionHash",
    "transactionIndex",
];

fn field(event: &Map<String, Value>, key: &str) -> String {
    event.get(key).map(display).unwrap_or_default()
}

fn block_time(event: &Map<String, Value>) -> String {
    event
        .get("blockTimestamp")
        .and_then(Value::as_i64)
        .map(format_timestamp)
        .unwrap_or_else(|| field(event, "blockTimestamp"))
}

/// Decoded parameters as `key: value, ...`, sorted by key.
fn event_data(event: &Map<String, Value>, skip: &[&str]) -> String {
    let data: Vec<String> = sorted(event)
        .into_iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .map(|(key, value)| format!("{key}: {}", display(value)))
        .collect();
    data.join(", ")
}

/// One streamed event as `| block | hash | time | key: value, ...`.
pub fn render_row(event: &Map<String, Value>) -> String {
    format!(
        "| {} | {:<15} | {} | {}",
        field(event, "blockNumber"),
        field(event, "blockHash"),
        block_time(event),
        event_data(event, &META_FIELDS)
    )
}

/// A streamed event from one of several contracts, led by its chain, network
/// and contract.
pub fn render_contract_row(event: &Map<String, Value>) -> String {
    format!(
        "{:<10} | {:<10} | {} | {:<15} | {} | {:<15} | {}",
        field(event, "chain"),
        field(event, "network"),
        field(event, "blockNumber"),
        field(event, "blockHash"),
        block_time(event),
        field(event, "contractAddress"),
        event_data(event, &META_FIELDS)
    )
}

pub fn render_replay_row(event: &Map<String, Value>) -> String {
    format!(
        "{} | {:<15} | {} | {} | {}",
        field(event, "blockNumber"),
        field(event, "blockHash"),
        block_time(event),
        field(event, "transactionIndex"),
        event_data(event, &REPLAY_FIELDS)
    )
}

/// Past events of `address`, one page at a time.
pub async fn replay(
    api: &ApiClient,
    address: &str,
    event: &str,
    pagination: &Pagination,
) -> Result<Vec<Map<String, Value>>, ApiError> {
    let query = [
        ("address", address.to_owned()),
        ("event", event.to_owned()),
        ("page", pagination.page.to_string()),
        ("per_page", pagination.per_page.to_string()),
    ];
    let page: EventPage = api.get_json("/v1/events", &query).await?;
    Ok(page.events)
}

/// Prints `header`, then one rendered row per streamed event until the
/// server closes the stream.
fn stream_rows(
    client: &ClientConfig,
    url: &str,
    header: &str,
    render: fn(&Map<String, Value>) -> String,
) -> eyre::Result<()> {
    let api_key = client.api_key()?;
    stream::exit_on_interrupt()?;

    println!("{header}");
    println!("{}", "-".repeat(120));

    config::block_on(stream::listen(url, api_key, |message| {
        match serde_json::from_str::<Map<String, Value>>(message) {
            Ok(event) => println!("{}", render(&event)),
            Err(e) => tracing::warn!("skipping malformed event: {e}"),
        }
    }))?
    .wrap_err("event stream failed")
}

fn contract_header() -> String {
    format!(
        "{:<10} | {:<10} | {:<8} | {:<15} | {:<19} | {:<15} | EVENT_DATA",
        "CHAIN", "NETWORK", "BLOCK#", "BLOCK_HASH", "TIMESTAMP", "CONTRACT"
    )
}

impl EventsList {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        config::block_on(self.list(client))?
    }

    async fn list(&self, client: &ClientConfig) -> eyre::Result<()> {
        let api = client.api()?;
        let path = format!("/v1/events/list/{}", self.pattern);
        let page: EventPage = api
            .get_json(&path, &self.pagination.query())
            .await
            .wrap_err("failed to list events")?;

        render_page(&mut io::stdout().lock(), &page)?;
        Ok(())
    }
}

impl EventsListen {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        if !self.addresses.is_empty() {
            let addresses = self.addresses.join(",");
            let url = stream::endpoint(
                &client.ws_url(),
                "/v1/listen",
                &[
                    ("addresses", addresses.as_str()),
                    ("event", self.event_filter.as_deref().unwrap_or_default()),
                ],
            )?;
            return stream_rows(client, &url, &contract_header(), render_contract_row);
        }

        let (Some(chain), Some(address), Some(event)) = (&self.chain, &self.address, &self.event)
        else {
            bail!("CHAIN, ADDRESS and EVENT are required unless --addresses is given");
        };
        let url = format!("{}/v1/{chain}/listen/{address}/{event}", client.ws_url());
        let header = format!(
            "{:<8} | {:<15} | {:<19} | EVENT_DATA",
            "BLOCK#", "BLOCK_HASH", "TIMESTAMP"
        );
        stream_rows(client, &url, &header, render_row)
    }
}

impl EventsCrossListen {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        let chains = self.chains.join(",");
        let url = stream::endpoint(
            &client.ws_url(),
            "/v1/cross-listen",
            &[
                ("contract", self.contract.as_str()),
                ("event", self.event.as_str()),
                ("chains", chains.as_str()),
            ],
        )?;
        stream_rows(client, &url, &contract_header(), render_contract_row)
    }
}

impl EventsReplay {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        config::block_on(self.fetch(client))?
    }

    async fn fetch(&self, client: &ClientConfig) -> eyre::Result<()> {
        let api = client.api()?;
        let events = replay(&api, &self.address, &self.event, &self.pagination)
            .await
            .wrap_err_with(|| format!("failed to replay events of {}", self.address))?;

        println!(
            "{:<8} | {:<15} | {:<19} | {:<8} | EVENT_DATA",
            "BLOCK#", "BLOCK_HASH", "TIMESTAMP", "TX_INDEX"
        );
        println!("{}", "-".repeat(100));
        if events.is_empty() {
            println!("No events found.");
        }
        for event in &events {
            println!("{}", render_replay_row(event));
        }
        Ok(())
    }
}
