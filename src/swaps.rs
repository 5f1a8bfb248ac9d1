use std::io::{self, Write};

use chrono::Utc;
use eyre::WrapErr;

use crate::{
    config::{self, ClientConfig, SwapsList},
    formatting::{format_amount, format_timestamp},
    models::{Swap, SwapPage},
    output::{self, OutputFormat},
};

const TABLE_HEADERS: [&str; 6] = ["Time", "Chain", "Transaction Hash", "From", "To", "Amount"];

const CSV_HEADERS: [&str; 16] = [
    "Timestamp",
    "Time",
    "Chain",
    "TX Hash",
    "From Token",
    "From Token Address",
    "From Amount Raw",
    "From Amount Formatted",
    "To Token",
    "To Token Address",
    "To Amount Raw",
    "To Amount Formatted",
    "From Sender",
    "To Sender",
    "Price Token1 In Token2",
    "Price Token2 In Token1",
];

/// `a SYM1 for b SYM2`.
pub fn describe(swap: &Swap) -> String {
    format!(
        "{} {} for {} {}",
        format_amount(swap.token1_amount, swap.token1_decimals),
        swap.token1_symbol,
        format_amount(swap.token2_amount, swap.token2_decimals),
        swap.token2_symbol
    )
}

pub fn render_table(out: &mut impl Write, page: &SwapPage) -> io::Result<()> {
    let meta = &page.meta;
    writeln!(out, "Token Swaps ({} found)", meta.total)?;
    writeln!(out, "Chains: {}", meta.chains.join(", "))?;
    writeln!(out, "Tokens: {}", meta.tokens.join(", "))?;
    writeln!(
        out,
        "Page: {} of {} (showing {} per page)\n",
        meta.page + 1,
        meta.page_count(),
        meta.per_page
    )?;

    let rows: Vec<Vec<String>> = page
        .swaps
        .iter()
        .map(|s| {
            vec![
                format_timestamp(s.timestamp),
                s.chain_name.clone(),
                s.tx_hash.clone(),
                s.token1_symbol.clone(),
                s.token2_symbol.clone(),
                describe(s),
            ]
        })
        .collect();
    writeln!(out, "{}", output::table(&TABLE_HEADERS, &rows))
}

pub fn render_csv(out: impl Write, page: &SwapPage, exported_at: i64) -> csv::Result<()> {
    let mut writer = output::csv_writer(out);
    writer.write_record(CSV_HEADERS)?;

    for s in &page.swaps {
        writer.write_record([
            s.timestamp.to_string(),
            format_timestamp(s.timestamp),
            s.chain_name.clone(),
            s.tx_hash.clone(),
            s.token1_symbol.clone(),
            s.token1_address.clone(),
            s.token1_amount.unwrap_or_default().to_string(),
            format_amount(s.token1_amount, s.token1_decimals),
            s.token2_symbol.clone(),
            s.token2_address.clone(),
            s.token2_amount.unwrap_or_default().to_string(),
            format_amount(s.token2_amount, s.token2_decimals),
            s.token1_sender.clone(),
            s.token2_sender.clone(),
            s.price_token1_in_token2.map(|p| p.to_string()).unwrap_or_default(),
            s.price_token2_in_token1.map(|p| p.to_string()).unwrap_or_default(),
        ])?;
    }

    let meta = &page.meta;
    output::write_csv_metadata(
        &mut writer,
        &[
            ("Export Time", format_timestamp(exported_at)),
            ("Data Timestamp", format_timestamp(meta.timestamp)),
            ("Total Swaps", meta.total.to_string()),
            ("Page", (meta.page + 1).to_string()),
            ("Per Page", meta.per_page.to_string()),
            ("Chains", meta.chains.join(", ")),
            ("Tokens", meta.tokens.join(", ")),
        ],
    )
}

impl SwapsList {
    pub fn run(&self, client: &ClientConfig) -> eyre::Result<()> {
        config::block_on(self.list(client))?
    }

    async fn list(&self, client: &ClientConfig) -> eyre::Result<()> {
        let api = client.api()?;
        let path = format!("/v1/swaps/list/{}", self.pattern);
        let body = api
            .get_text(&path, &self.pagination.query())
            .await
            .wrap_err("failed to list swaps")?;

        if self.format == OutputFormat::Json {
            println!("{body}");
            return Ok(());
        }

        let page: SwapPage = serde_json::from_str(&body).wrap_err("failed to parse swaps")?;
        let stdout = io::stdout();
        match self.format {
            OutputFormat::Csv => render_csv(stdout.lock(), &page, Utc::now().timestamp())?,
            _ => render_table(&mut stdout.lock(), &page)?,
        }
        Ok(())
    }
}
