//! End-to-end ingestion: load, locate the header, name fields, materialize.
//! A container that fails to load is repaired once and retried.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::clean::{CleanTable, materialize};
use crate::config::IngestOptions;
use crate::error::{IngestError, Result};
use crate::header::{locate, scorer_for};
use crate::loader::{self, RawGrid, SheetSelector, SourceFormat};
use crate::names::build_names;
use crate::repair::{self, RepairedSource};

/// Result of one ingestion call.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub table: CleanTable,
    /// File the table was read from: the original, or the repaired copy that
    /// later stages should keep using.
    pub source: PathBuf,
    pub repaired: Option<RepairedSource>,
    /// Row of the source grid used as header, `None` for an empty source.
    pub header_row: Option<usize>,
}

/// Header detection, naming and materialization over an already loaded grid.
pub fn extract_table(grid: &RawGrid, options: &IngestOptions) -> (CleanTable, Option<usize>) {
    if grid.is_empty() {
        return (CleanTable::default(), None);
    }
    let scorer = scorer_for(&options.header);
    let header_index = locate(grid, scorer.as_ref(), options.header.scan_rows);
    let header = grid.row(header_index).unwrap_or_default();
    let names = build_names(header);
    let table = materialize(grid, header_index, &names);
    (table, Some(header_index))
}

pub fn ingest(
    path: &Path,
    selector: Option<&SheetSelector>,
    options: &IngestOptions,
) -> Result<Ingested> {
    match loader::load(path, selector, options) {
        Ok(grid) => Ok(finish(grid, path.to_path_buf(), None, options)),
        Err(err) if should_repair(path, &err, options) => {
            warn!("{err}; trying repair");
            let repaired = repair::repair(path)?;
            let retry_selector = selector.map(|s| repaired.translate(s));
            let grid = loader::load(&repaired.path, retry_selector.as_ref(), options)?;
            Ok(finish(grid, repaired.path.clone(), Some(repaired), options))
        }
        Err(err) => Err(err),
    }
}

/// Sheet names of a source, repairing an unopenable container once.
pub fn list_sheets(path: &Path, options: &IngestOptions) -> Result<(Vec<String>, Option<RepairedSource>)> {
    match loader::list_sheets(path) {
        Ok(names) => Ok((names, None)),
        Err(err) if should_repair(path, &err, options) => {
            warn!("{err}; trying repair");
            let repaired = repair::repair(path)?;
            Ok((repaired.sheet_names(), Some(repaired)))
        }
        Err(err) => Err(err),
    }
}

fn should_repair(path: &Path, err: &IngestError, options: &IngestOptions) -> bool {
    options.repair.enabled && err.is_unreadable() && SourceFormat::from_path(path).is_container()
}

fn finish(
    grid: RawGrid,
    source: PathBuf,
    repaired: Option<RepairedSource>,
    options: &IngestOptions,
) -> Ingested {
    let (table, header_row) = extract_table(&grid, options);
    info!(
        "Ingested {} row(s) x {} column(s) from {source:?}",
        table.len(),
        table.columns().len()
    );
    Ingested {
        table,
        source,
        repaired,
        header_row,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn scenario_blank_first_row() {
        let grid = RawGrid::from_rows(vec![
            vec![Cell::text(""), Cell::text(""), Cell::text("")],
            vec![Cell::text("Name"), Cell::text("Email"), Cell::text("Amount")],
            vec![Cell::text("Alice"), Cell::text("a@x.com"), Cell::text("100")],
        ]);
        let (table, header) = extract_table(&grid, &IngestOptions::default());
        assert_eq!(header, Some(1));
        assert_eq!(table.columns(), ["Name", "Email", "Amount"]);
        let record = table.record(0).unwrap();
        assert_eq!(record["Name"], "Alice");
        assert_eq!(record["Email"], "a@x.com");
        assert_eq!(record["Amount"], "100");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn empty_grid_is_empty_table_not_error() {
        let (table, header) = extract_table(&RawGrid::default(), &IngestOptions::default());
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
        assert_eq!(header, None);
    }

    #[test]
    fn missing_csv_is_terminal() {
        let err = ingest(Path::new("/nonexistent/x.csv"), None, &IngestOptions::default())
            .unwrap_err();
        assert!(err.is_unreadable());
    }
}
