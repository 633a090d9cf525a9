use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, pipeline, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let options = args.ingest.options()?;
    let ingested = pipeline::ingest(&args.input, args.sheet.as_ref(), &options)
        .with_context(|| format!("Reading {:?}", args.input))?;
    if ingested.table.is_empty() {
        println!("No data rows found.");
        return Ok(());
    }
    let head = ingested.table.head(args.rows);
    table::print_table(&head);
    info!(
        "Displayed {} of {} row(s) from {:?}",
        head.len(),
        ingested.table.len(),
        ingested.source
    );
    Ok(())
}
