//! Heuristic spreadsheet ingestion.
//!
//! Takes a messy, human-produced Excel or CSV export and returns a
//! [`CleanTable`]: the header row is located by scoring, field names are
//! made unique, blank rows are dropped and every cell is normalized to a
//! string. Workbooks the reader cannot open are rebuilt once by the
//! [`repair`] module and read again.
//!
//! ```ignore
//! use std::path::Path;
//! use smart_ingest::{IngestOptions, ingest};
//!
//! let ingested = ingest(Path::new("uploads/projects.xlsx"), None, &IngestOptions::default())?;
//! println!("{:?}", ingested.table.columns());
//! ```

pub mod cell;
pub mod clean;
pub mod cli;
pub mod config;
pub mod dates;
pub mod error;
pub mod header;
pub mod io_utils;
pub mod loader;
pub mod mapping;
pub mod names;
pub mod pipeline;
pub mod preview;
pub mod repair;
pub mod table;
pub mod text;

use std::{env, io::Write, path::Path, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, info, warn};

pub use crate::clean::CleanTable;
pub use crate::config::IngestOptions;
pub use crate::error::IngestError;
pub use crate::loader::{RawGrid, SheetSelector};
pub use crate::pipeline::{Ingested, ingest};

use crate::cli::{Cli, Commands, OutputFormat};
use crate::mapping::{ColumnMapping, MappedRows};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("smart_ingest", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Read(args) => handle_read(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Sheets(args) => handle_sheets(&args),
        Commands::Repair(args) => handle_repair(&args),
        Commands::Map(args) => handle_map(&args),
        Commands::Template(args) => handle_template(&args),
        Commands::Date(args) => handle_date(&args),
    }
}

fn handle_read(args: &cli::ReadArgs) -> Result<()> {
    let options = args.ingest.options()?;
    let ingested = ingest(&args.input, args.sheet.as_ref(), &options)
        .with_context(|| format!("Reading {:?}", args.input))?;
    report_repair(&ingested);
    let table = match args.limit {
        Some(limit) => ingested.table.head(limit),
        None => ingested.table,
    };
    if table.is_empty() {
        warn!("No data rows found in {:?}", args.input);
    }
    write_table(&table, args.format, args.output.as_deref())?;
    info!(
        "Emitted {} row(s) across {} column(s)",
        table.len(),
        table.columns().len()
    );
    Ok(())
}

fn handle_sheets(args: &cli::SheetsArgs) -> Result<()> {
    let options = args.ingest.options()?;
    let (names, repaired) = pipeline::list_sheets(&args.input, &options)
        .with_context(|| format!("Listing sheets of {:?}", args.input))?;
    if let Some(repaired) = repaired {
        info!("Sheets read from repaired copy {:?}", repaired.path);
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn handle_repair(args: &cli::RepairArgs) -> Result<()> {
    let repaired =
        repair::repair(&args.input).with_context(|| format!("Repairing {:?}", args.input))?;
    for sheet in &repaired.sheets {
        if sheet.original != sheet.name {
            info!("Sheet '{}' renamed to '{}'", sheet.original, sheet.name);
        }
    }
    println!("{}", repaired.path.display());
    Ok(())
}

fn handle_map(args: &cli::MapArgs) -> Result<()> {
    let options = args.ingest.options()?;
    let ingested = ingest(&args.input, args.sheet.as_ref(), &options)
        .with_context(|| format!("Reading {:?}", args.input))?;
    report_repair(&ingested);

    let mut columns = if args.from_template {
        ColumnMapping::from_template(ingested.table.columns())
    } else {
        ColumnMapping::new()
    };
    let explicit = ColumnMapping::parse_assignments(&args.assignments)?;
    for field in mapping::ProjectField::ALL {
        if let Some(column) = explicit.column(field) {
            columns.assign(field, column);
        }
    }

    let mapped = mapping::map_rows(&ingested.table, &columns, options.dates.order)?;
    for skipped in &mapped.skipped {
        warn!("Skipped row {}: {}", skipped.row, skipped.reason);
    }
    write_mapped(&mapped, args.format, args.output.as_deref())?;
    info!(
        "Mapped {} record(s), skipped {}",
        mapped.records.len(),
        mapped.skipped.len()
    );
    Ok(())
}

fn handle_template(args: &cli::TemplateArgs) -> Result<()> {
    mapping::write_template(&args.output)
        .with_context(|| format!("Writing template to {:?}", args.output))?;
    info!("Template written to {:?}", args.output);
    Ok(())
}

fn handle_date(args: &cli::DateArgs) -> Result<()> {
    for value in &args.values {
        println!("{}", dates::parse_date(value, args.date_order));
    }
    Ok(())
}

fn report_repair(ingested: &Ingested) {
    if let Some(repaired) = &ingested.repaired {
        warn!(
            "Source was unreadable; continue with repaired copy {:?}",
            repaired.path
        );
    }
}

fn write_table(table: &CleanTable, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let rendered = table::render_table(table);
            write_text(output, &rendered)
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(table).context("Serializing table to JSON")?;
            write_text(output, &(json + "\n"))
        }
        OutputFormat::Csv => {
            let mut writer = io_utils::open_csv_writer(output, io_utils::DEFAULT_CSV_DELIMITER)?;
            writer
                .write_record(table.columns())
                .context("Writing output headers")?;
            for (idx, row) in table.rows().iter().enumerate() {
                writer
                    .write_record(row)
                    .with_context(|| format!("Writing output row {}", idx + 1))?;
            }
            writer.flush().context("Flushing output writer")?;
            Ok(())
        }
    }
}

fn write_mapped(mapped: &MappedRows, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(mapped).context("Serializing records to JSON")?;
            write_text(output, &(json + "\n"))
        }
        OutputFormat::Csv => {
            let mut writer = io_utils::open_csv_writer(output, io_utils::DEFAULT_CSV_DELIMITER)?;
            for record in &mapped.records {
                writer.serialize(record).context("Writing mapped record")?;
            }
            writer.flush().context("Flushing output writer")?;
            Ok(())
        }
        OutputFormat::Table => bail!("map output supports json or csv"),
    }
}

fn write_text(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) if !io_utils::is_dash(path) => {
            std::fs::write(path, text).with_context(|| format!("Writing output file {path:?}"))
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("Writing to stdout")?;
            stdout.flush().context("Flushing stdout")
        }
    }
}
