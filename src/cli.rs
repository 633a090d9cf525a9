use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{IngestOptions, ScorerKind};
use crate::dates::DateOrder;
use crate::loader::SheetSelector;

#[derive(Debug, Parser)]
#[command(author, version, about = "Read messy Excel/CSV exports into clean tables", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest a spreadsheet and emit the clean table
    Read(ReadArgs),
    /// Show the first rows of the clean table
    Preview(PreviewArgs),
    /// List worksheet names
    Sheets(SheetsArgs),
    /// Rebuild a damaged workbook next to the original
    Repair(RepairArgs),
    /// Map table columns onto project record fields
    Map(MapArgs),
    /// Write the quick-import template workbook
    Template(TemplateArgs),
    /// Normalize date strings to YYYY-MM-DD
    Date(DateArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Options shared by every command that runs the ingestion pipeline.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// YAML file with ingestion options
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Number of leading rows searched for the header
    #[arg(long = "scan-rows")]
    pub scan_rows: Option<usize>,
    /// Header scoring heuristic
    #[arg(long)]
    pub scorer: Option<ScorerKind>,
    /// Reading of ambiguous numeric dates
    #[arg(long = "date-order")]
    pub date_order: Option<DateOrder>,
    /// Fail instead of repairing an unreadable workbook
    #[arg(long = "no-repair")]
    pub no_repair: bool,
}

impl IngestArgs {
    pub fn options(&self) -> Result<IngestOptions> {
        let mut options = match &self.config {
            Some(path) => IngestOptions::load(path)
                .with_context(|| format!("Loading options from {path:?}"))?,
            None => IngestOptions::default(),
        };
        if let Some(rows) = self.scan_rows {
            options.header.scan_rows = rows.max(1);
        }
        if let Some(scorer) = self.scorer {
            options.header.scorer = scorer;
        }
        if let Some(order) = self.date_order {
            options.dates.order = order;
        }
        if self.no_repair {
            options.repair.enabled = false;
        }
        Ok(options)
    }
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Input spreadsheet (.csv, .tsv, .xls, .xlsx, .xlsm, .xlsb, .ods)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Worksheet name, or zero-based index
    #[arg(short, long)]
    pub sheet: Option<SheetSelector>,
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Limit number of rows emitted
    #[arg(long)]
    pub limit: Option<usize>,
    #[command(flatten)]
    pub ingest: IngestArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[arg(short, long)]
    pub sheet: Option<SheetSelector>,
    /// Number of rows to display
    #[arg(long, default_value_t = 15)]
    pub rows: usize,
    #[command(flatten)]
    pub ingest: IngestArgs,
}

#[derive(Debug, Args)]
pub struct SheetsArgs {
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[command(flatten)]
    pub ingest: IngestArgs,
}

#[derive(Debug, Args)]
pub struct RepairArgs {
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[arg(short, long)]
    pub sheet: Option<SheetSelector>,
    /// Field assignment such as `funding=งบประมาณ` (repeatable)
    #[arg(long = "map", action = clap::ArgAction::Append)]
    pub assignments: Vec<String>,
    /// Map columns whose headers match the import template
    #[arg(long = "from-template")]
    pub from_template: bool,
    /// Output format (json or csv)
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub ingest: IngestArgs,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Destination .xlsx file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct DateArgs {
    /// Values to normalize
    #[arg(required = true)]
    pub values: Vec<String>,
    #[arg(long = "date-order", default_value = "day-first")]
    pub date_order: DateOrder,
}
