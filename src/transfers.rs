use std::io::{self, Write};

use chrono::Utc;
use eyre::WrapErr;
use owo_colors::OwoColorize;

use crate::{
    config::{self, ClientConfig, TransfersList, TransfersSubscribe},
    formatting::{format_amount, format_chain, format_timestamp},
    models::{Transfer, TransferPage},
    output::{self, OutputFormat},
    stream,
};

const TABLE_HEADERS: [&str; 7] = ["Time", "From", "To", "Amount", "Symbol", "Chain", "TX Hash"];

const CSV_HEADERS: [&str; 12] = [
    "Timestamp",
    "Time",
    "From Address",
    "To Address",
    "Amount (Raw)",
    "Amount (Formatted)",
    "Token Symbol",
    "Token Address",
    "Chain",
    "Network",
    "TX Hash",
    "Position",
];

pub fn render_table(out: &mut impl Write, page: &TransferPage) -> io::Result<()> {
    let rows: Vec<Vec<String>> = page
        .transfers
        .iter()
        .map(|t| {
            vec![
                format_timestamp(t.timestamp),
                t.from_address.clone(),
                t.to_address.clone(),
                format_amount(t.amount, t.decimals),
                t.symbol.clone(),
                format_chain(&t.chain, &t.network),
                t.tx_hash.clone(),
            ]
        })
        .collect();
    writeln!(out, "{}", output::table(&TABLE_HEADERS, &rows))?;

    let meta = &page.meta;
    writeln!(out, "\nMetadata:")?;
    writeln!(out, "Timestamp: {}", format_timestamp(meta.timestamp))?;
    writeln!(out, "Total transfers: {}", meta.total)?;
    writeln!(out, "Page: {} of {}", meta.page + 1, meta.page_count())?;
    writeln!(out, "Chains: {}", meta.chains.join(", "))?;
    writeln!(out, "Tokens: {}", meta.tokens.join(", "))?;
    Ok(())
}

pub fn render_csv(out: impl Write, page: &TransferPage, exported_at: i64) -> csv::Result<()> {
    let mut writer = output::csv_writer(out);
    writer.write_record(CSV_HEADERS)?;

    for t in &page.transfers {
        writer.write_record([
            t.timestamp.to_string(),
            format_timestamp(t.timestamp),
            t.from_address.clone(),
            t.to_address.clone(),
            t.amount.unwrap_or_default().to_string(),
            format_amount(t.amount, t.decimals),
            t.symbol.clone(),
            t.token_address.clone(),
            t.chain.clone(),
            t.network.clone(),
            t.tx_hash.clone(),
            t.position.to_string(),
        ])?;
    }

    let meta = &page.meta;
    output::write_csv_metadata(
        &mut writer,
        &[
            ("Export Time", format_timestamp(exported_at)),
            ("Data Timestamp", format_timestamp(meta.timestamp)),
            ("Total Transfers", meta.total.to_string()),
            ("Page", (meta.page + 1).to_string()),
            ("Per Page", meta.per_page.to_string()),
            ("Chains", meta.chains.join(", ")),
            ("Tokens", meta.tokens.join(", ")),
        ],
    )
}

/// One streamed transfer as a boxed card.
pub fn render_card(out: &mut impl Write, t: &Transfer) -> io::Result<()> {
    let line = "─".repeat(120);
    let label = |name: &str| format!("{name:<9}").bright_black().to_string();

    writeln!(out, "┌{line}┐")?;
    writeln!(
        out,
        "│ {}",
        format!("{} → {} Transfer", format_chain(&t.chain, &t.network), t.symbol).bold()
    )?;
    writeln!(out, "│ {} {}", label("Timestamp:"), format_timestamp(t.timestamp))?;
    writeln!(out, "│ {} {}", label("TX Hash:"), t.tx_hash)?;
    writeln!(out, "│ {}", "─".repeat(118))?;
    writeln!(out, "│ {} {}{}", label("From:"), t.from_address, owner(&t.from_owner, &t.from_address))?;
    writeln!(out, "│ {} {}{}", label("To:"), t.to_address, owner(&t.to_owner, &t.to_address))?;
    writeln!(
        out,
        "│ {} {}",
        label("Amount:"),
        format!("{} {}", format_amount(t.amount, t.decimals), t.symbol).bold()
    )?;
    writeln!(out, "│ {} {}", label("Token:"), t.token_address)?;
    writeln!(out, "│ {} {}", label("Position:"), t.position)?;
    writeln!(out, "└{line}┘")
}

fn owner(owner: &str, address: &str) -> String {
    if owner.is_empty() || owner == address {
        return String::new();
    }
    format!(" {}", format!("(Owner: {owner})").bright_black())
}

impl TransfersList {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        config::block_on(self.list(client))?
    }

    async fn list(&self, client: &ClientConfig) -> eyre::Result<()> {
        let api = client.api()?;
        let path = format!("/v1/transfers/list/{}", self.pattern);
        let body = api
            .get_text(&path, &self.pagination.query())
            .await
            .wrap_err("failed to list transfers")?;

        if self.format == OutputFormat::Json {
            println!("{body}");
            return Ok(());
        }

        let page: TransferPage =
            serde_json::from_str(&body).wrap_err("failed to parse transfers")?;
        let stdout = io::stdout();
        match self.format {
            OutputFormat::Csv => render_csv(stdout.lock(), &page, Utc::now().timestamp())?,
            _ => render_table(&mut stdout.lock(), &page)?,
        }
        Ok(())
    }
}

impl TransfersSubscribe {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        let url = format!("{}/v1/transfer/stream/{}", client.ws_url(), self.pattern);
        let api_key = client.api_key()?;
        stream::exit_on_interrupt()?;

        config::block_on(stream::listen(&url, api_key, |message| {
            match serde_json::from_str::<Transfer>(message) {
                Ok(transfer) => {
                    if let Err(e) = render_card(&mut io::stdout().lock(), &transfer) {
                        tracing::warn!("failed to print transfer: {e}");
                    }
                }
                Err(e) => tracing::warn!("skipping malformed transfer: {e}"),
            }
        }))?
        .wrap_err("transfer stream failed")
    }
}

#[cfg(test)]
mod tests {
    use owo_colors::OwoColorize;

    use crate::models::TransferPage;

    use super::{render_card, render_csv, render_table};

    fn page() -> TransferPage {
        serde_json::from_str(
            r#"{
                "meta": {
                    "timestamp": 1700000000,
                    "chains": ["ethereum", "polygon"],
                    "tokens": ["USDC"],
                    "page": 1,
                    "per_page": 2,
                    "total": 5
                },
                "transfers": [
                    {
                        "timestamp": 1700000000,
                        "from_address": "0x1111111111111111111111111111111111111111",
                        "to_address": "0x2222222222222222222222222222222222222222",
                        "amount": 1500000,
                        "token_address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                        "symbol": "USDC",
                        "chain": "ethereum",
                        "network": "mainnet",
                        "tx_hash": "0xabc",
                        "decimals": 6,
                        "position": 3
                    },
                    {
                        "timestamp": 1700000060,
                        "from_address": "0x3333333333333333333333333333333333333333",
                        "to_address": "0x4444444444444444444444444444444444444444",
                        "amount": "25000000",
                        "symbol": "USDC",
                        "chain": "polygon",
                        "network": "amoy",
                        "tx_hash": "0xdef",
                        "decimals": 6,
                        "position": 0
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn table_shows_formatted_amounts_and_paging() {
        let mut out = Vec::new();
        render_table(&mut out, &page()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("TX Hash"));
        assert!(text.contains("2023-11-14 22:13:20"));
        assert!(text.contains("1.5"));
        assert!(text.contains("polygon.amoy"));
        assert!(text.contains("Total transfers: 5"));
        assert!(text.contains("Page: 2 of 3"));
        assert!(text.contains("Chains: ethereum, polygon"));
    }

    #[test]
    fn csv_keeps_raw_and_formatted_amounts() {
        let mut out = Vec::new();
        render_csv(&mut out, &page(), 1700000100).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Timestamp,Time,From Address,To Address,Amount (Raw),Amount (Formatted),\
             Token Symbol,Token Address,Chain,Network,TX Hash,Position"
        );
        assert_eq!(
            lines[1],
            "1700000000,2023-11-14 22:13:20,0x1111111111111111111111111111111111111111,\
             0x2222222222222222222222222222222222222222,1500000,1.5,USDC,\
             0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48,ethereum,mainnet,0xabc,3"
        );
        assert!(lines[2].contains(",25000000,25,"));
        assert_eq!(lines[3], "# Metadata:");
        assert_eq!(lines[4], "# Export Time,2023-11-14 22:15:00");
        assert!(lines.contains(&"# Total Transfers,5"));
        assert!(lines.contains(&"# Page,2"));
        assert!(lines.contains(&"# Chains,\"ethereum, polygon\""));
    }

    #[test]
    fn card_shows_owners_only_when_distinct() {
        let mut transfer = page().transfers[0].clone();
        transfer.from_owner = "0x9999999999999999999999999999999999999999".to_owned();
        transfer.to_owner = transfer.to_address.clone();

        let mut out = Vec::new();
        render_card(&mut out, &transfer).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains(&"ethereum → USDC Transfer".bold().to_string()));
        assert!(text.contains(&"1.5 USDC".bold().to_string()));
        assert!(text.contains("Owner: 0x9999999999999999999999999999999999999999"));
        assert_eq!(text.matches("Owner:").count(), 1);
    }
}
