//! Source loading: turns a file into a headerless, rectangular [`RawGrid`].
//!
//! Text files go through the encoding fallback list; spreadsheet containers
//! are opened with the `calamine` reader matching their extension. Every
//! failure surfaces as [`IngestError::UnreadableSource`].

use std::{
    fmt,
    fs::{self, File},
    io::BufReader,
    path::Path,
    str::FromStr,
};

use calamine::{Data, Ods, Range, Reader, Sheets, Xls, Xlsb, Xlsx, open_workbook};
use log::{debug, info};

use crate::cell::Cell;
use crate::config::IngestOptions;
use crate::error::{IngestError, Result};
use crate::io_utils::{self, EncodingCandidate};

/// Sheet name reported for text sources, which have exactly one table.
pub const CSV_SHEET_NAME: &str = "CSV_File";

/// Values the CSV loader reads as missing.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// Legacy binary `.xls`.
    Legacy,
    /// Binary `.xlsb`.
    Binary,
    OpenDocument,
    /// Zip-based XML `.xlsx`/`.xlsm`; also the fallback for unknown extensions.
    Modern,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => SourceFormat::Csv,
            "xls" | "xla" => SourceFormat::Legacy,
            "xlsb" => SourceFormat::Binary,
            "ods" => SourceFormat::OpenDocument,
            _ => SourceFormat::Modern,
        }
    }

    pub fn is_container(self) -> bool {
        self != SourceFormat::Csv
    }
}

/// Worksheet selection for container formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Name(String),
    Index(usize),
}

impl SheetSelector {
    /// Position of the selected sheet in `names`. A name that matches no
    /// sheet but parses as a number falls back to that zero-based index.
    pub fn resolve(&self, names: &[String]) -> Option<usize> {
        match self {
            SheetSelector::Index(idx) => (*idx < names.len()).then_some(*idx),
            SheetSelector::Name(name) => names
                .iter()
                .position(|candidate| candidate == name)
                .or_else(|| {
                    names
                        .iter()
                        .position(|candidate| candidate.trim().eq_ignore_ascii_case(name.trim()))
                })
                .or_else(|| {
                    name.trim()
                        .parse::<usize>()
                        .ok()
                        .filter(|idx| *idx < names.len())
                }),
        }
    }
}

impl FromStr for SheetSelector {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Ok(SheetSelector::Name(value.to_string()))
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Name(name) => write!(f, "'{name}'"),
            SheetSelector::Index(idx) => write!(f, "#{idx}"),
        }
    }
}

/// Headerless grid of raw cells. Every row has `width` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl RawGrid {
    /// Pads ragged rows with [`Cell::Empty`].
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Self { rows, width }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// No rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }
}

impl From<&Range<Data>> for RawGrid {
    /// Anchors the range at A1 so row indices are true sheet positions.
    fn from(range: &Range<Data>) -> Self {
        let Some((start_row, start_col)) = range.start() else {
            return RawGrid::default();
        };
        let mut rows = Vec::with_capacity(start_row as usize + range.height());
        rows.resize_with(start_row as usize, Vec::new);
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; start_col as usize];
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }
        RawGrid::from_rows(rows)
    }
}

pub fn load(
    path: &Path,
    selector: Option<&SheetSelector>,
    options: &IngestOptions,
) -> Result<RawGrid> {
    let format = SourceFormat::from_path(path);
    debug!("Loading {path:?} as {format:?}");
    let grid = match format {
        SourceFormat::Csv => load_csv(path, &options.csv.encodings)?,
        _ => load_sheet(path, format, selector)?,
    };
    debug!(
        "Loaded {} row(s) x {} column(s) from {path:?}",
        grid.len(),
        grid.width()
    );
    Ok(grid)
}

/// Worksheet names of a source; text files report [`CSV_SHEET_NAME`].
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    let format = SourceFormat::from_path(path);
    if format == SourceFormat::Csv {
        if !path.is_file() {
            return Err(IngestError::unreadable(path, "file not found"));
        }
        return Ok(vec![CSV_SHEET_NAME.to_string()]);
    }
    let workbook = open_container(path, format)?;
    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(IngestError::unreadable(path, "workbook has no sheets"));
    }
    Ok(names)
}

pub(crate) fn open_container(
    path: &Path,
    format: SourceFormat,
) -> Result<Sheets<BufReader<File>>> {
    let opened = match format {
        SourceFormat::Legacy => open_workbook::<Xls<_>, _>(path)
            .map(Sheets::Xls)
            .map_err(|e| e.to_string()),
        SourceFormat::Binary => open_workbook::<Xlsb<_>, _>(path)
            .map(Sheets::Xlsb)
            .map_err(|e| e.to_string()),
        SourceFormat::OpenDocument => open_workbook::<Ods<_>, _>(path)
            .map(Sheets::Ods)
            .map_err(|e| e.to_string()),
        SourceFormat::Modern | SourceFormat::Csv => open_workbook::<Xlsx<_>, _>(path)
            .map(Sheets::Xlsx)
            .map_err(|e| e.to_string()),
    };
    opened.map_err(|reason| IngestError::unreadable(path, reason))
}

fn load_sheet(
    path: &Path,
    format: SourceFormat,
    selector: Option<&SheetSelector>,
) -> Result<RawGrid> {
    let mut workbook = open_container(path, format)?;
    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(IngestError::unreadable(path, "workbook has no sheets"));
    }
    let index = match selector {
        Some(selector) => selector.resolve(&names).ok_or_else(|| {
            IngestError::unreadable(path, format!("no worksheet matches {selector}"))
        })?,
        None => 0,
    };
    let name = &names[index];
    let range = workbook
        .worksheet_range(name)
        .map_err(|e| IngestError::unreadable(path, format!("sheet '{name}': {e}")))?;
    info!("Reading sheet '{name}' from {path:?}");
    Ok(RawGrid::from(&range))
}

fn load_csv(path: &Path, encodings: &[String]) -> Result<RawGrid> {
    let bytes = fs::read(path).map_err(|e| IngestError::unreadable(path, e.to_string()))?;
    let delimiter = io_utils::resolve_input_delimiter(path);

    let mut attempted = Vec::new();
    for label in encodings {
        let Some(candidate) = io_utils::resolve_candidate(label) else {
            debug!("Skipping unknown encoding label '{label}'");
            continue;
        };
        attempted.push(candidate.name());
        match parse_csv(&bytes, candidate, delimiter) {
            Some(rows) => {
                info!("Decoded {path:?} as {}", candidate.name());
                return Ok(RawGrid::from_rows(rows));
            }
            None => debug!("{path:?} is not valid {}", candidate.name()),
        }
    }
    Err(IngestError::unreadable(
        path,
        format!("no candidate encoding decoded the file (tried {})", attempted.join(", ")),
    ))
}

fn parse_csv(bytes: &[u8], candidate: EncodingCandidate, delimiter: u8) -> Option<Vec<Vec<Cell>>> {
    let text = candidate.decode(bytes)?;
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.ok()?;
        if is_blank_line(&record) {
            continue;
        }
        rows.push(record.iter().map(csv_cell).collect());
    }
    Some(rows)
}

fn is_blank_line(record: &csv::StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_none_or(|field| field.trim().is_empty())
}

fn csv_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
        Cell::Empty
    } else {
        Cell::Text(field.to_string())
    }
}
