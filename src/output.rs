use std::io::Write;

use ascii_table::AsciiTable;
use clap::ValueEnum;

/// Wide enough for two full addresses and a transaction hash.
const TABLE_WIDTH: usize = 250;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Renders `rows` under `headers` as a boxed ASCII table.
pub fn table<R>(headers: &[&str], rows: &[R]) -> String
where
    R: AsRef<[String]>,
{
    let mut table = AsciiTable::default();
    table.set_max_width(TABLE_WIDTH);
    for (i, header) in headers.iter().enumerate() {
        table.column(i).set_header(*header);
    }

    let data: Vec<&[String]> = rows.iter().map(AsRef::as_ref).collect();
    table.format(data)
}

/// A CSV writer that allows the trailing metadata rows to be shorter than
/// the data rows.
pub fn csv_writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().flexible(true).from_writer(out)
}

/// Appends `# key, value` rows after the data.
pub fn write_csv_metadata<W: Write>(
    writer: &mut csv::Writer<W>,
    rows: &[(&str, String)],
) -> csv::Result<()> {
    writer.write_record(["# Metadata:"])?;
    for (key, value) in rows {
        writer.write_record([format!("# {key}").as_str(), value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
