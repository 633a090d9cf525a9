//! Rebuilds a workbook that the normal loader could not open.
//!
//! The file is re-opened with content sniffing instead of trusting its
//! extension, every worksheet that still parses is kept, and the survivors
//! are written verbatim into a fresh `<stem>_repaired.xlsx` next to the
//! original under sanitized sheet names.

use std::{
    collections::HashSet,
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use log::{info, warn};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::error::{IngestError, Result};
use crate::loader::{SheetSelector, SourceFormat};

pub const MAX_SHEET_NAME_LEN: usize = 31;
pub const DEFAULT_SHEET_NAME: &str = "Sheet";
const RESERVED_SHEET_CHARS: &[char] = &[':', '/', '\\', '?', '*', '[', ']'];
const REPAIRED_SUFFIX: &str = "_repaired";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedSheet {
    pub original: String,
    pub name: String,
}

/// A rebuilt workbook and the sheets written into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedSource {
    pub path: PathBuf,
    pub sheets: Vec<RepairedSheet>,
}

impl RepairedSource {
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }

    /// Carries a selector over to the repaired file: names follow their
    /// sanitized form, indices count recovered sheets.
    pub fn translate(&self, selector: &SheetSelector) -> SheetSelector {
        match selector {
            SheetSelector::Name(name) => self
                .sheets
                .iter()
                .find(|sheet| &sheet.original == name)
                .map(|sheet| SheetSelector::Name(sheet.name.clone()))
                .unwrap_or_else(|| selector.clone()),
            SheetSelector::Index(_) => selector.clone(),
        }
    }
}

pub fn repaired_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    path.with_file_name(format!("{stem}{REPAIRED_SUFFIX}.xlsx"))
}

pub fn repair(path: &Path) -> Result<RepairedSource> {
    if !SourceFormat::from_path(path).is_container() {
        return Err(IngestError::repair_failed(
            path,
            "text sources have no container to repair",
        ));
    }
    info!("Attempting repair of {path:?}");
    let bytes = fs::read(path).map_err(|e| IngestError::repair_failed(path, e.to_string()))?;
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::repair_failed(path, e.to_string()))?;

    let mut recovered = Vec::new();
    for name in workbook.sheet_names() {
        match workbook.worksheet_range(&name) {
            Ok(range) => recovered.push((name, range)),
            Err(err) => warn!("Dropping unreadable sheet '{name}' from {path:?}: {err}"),
        }
    }
    if recovered.is_empty() {
        return Err(IngestError::repair_failed(path, "no worksheet could be recovered"));
    }

    let target = repaired_path(path);
    let sheets = write_workbook(&target, &recovered)
        .map_err(|e| IngestError::repair_failed(path, e.to_string()))?;
    info!(
        "Repaired {path:?} into {target:?} with {} sheet(s)",
        sheets.len()
    );
    Ok(RepairedSource {
        path: target,
        sheets,
    })
}

fn write_workbook(
    target: &Path,
    recovered: &[(String, Range<Data>)],
) -> std::result::Result<Vec<RepairedSheet>, XlsxError> {
    let mut workbook = Workbook::new();
    let mut used = HashSet::new();
    let mut sheets = Vec::with_capacity(recovered.len());

    for (original, range) in recovered {
        let name = unique_sheet_name(&sanitize_sheet_name(original), &mut used);
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&name)?;
        write_range(worksheet, range)?;
        sheets.push(RepairedSheet {
            original: original.clone(),
            name,
        });
    }
    workbook.save(target)?;
    Ok(sheets)
}

fn write_range(worksheet: &mut Worksheet, range: &Range<Data>) -> std::result::Result<(), XlsxError> {
    let Some((start_row, start_col)) = range.start() else {
        return Ok(());
    };
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let duration_format = Format::new().set_num_format("[h]:mm:ss");

    for (rel_row, rel_col, value) in range.cells() {
        let row = start_row + rel_row as u32;
        let col = u16::try_from(start_col as usize + rel_col)
            .map_err(|_| XlsxError::RowColumnLimitError)?;
        match value {
            Data::Empty | Data::Error(_) => {}
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                worksheet.write_string(row, col, s)?;
            }
            Data::Float(f) => {
                worksheet.write_number(row, col, *f)?;
            }
            Data::Int(i) => {
                worksheet.write_number(row, col, *i as f64)?;
            }
            Data::Bool(b) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                let format = if dt.is_duration() {
                    &duration_format
                } else if serial.fract() == 0.0 {
                    &date_format
                } else {
                    &datetime_format
                };
                worksheet.write_number_with_format(row, col, serial, format)?;
            }
        }
    }
    Ok(())
}

/// Sheet name valid for the container format: no control or reserved
/// characters, no edge apostrophes, at most 31 characters, never empty.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if RESERVED_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let truncated: String = trim_edges(&cleaned).chars().take(MAX_SHEET_NAME_LEN).collect();
    let result = trim_edges(&truncated);
    if result.is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        result.to_string()
    }
}

fn trim_edges(value: &str) -> &str {
    value.trim_matches(|c: char| c == '\'' || c.is_whitespace())
}

/// Appends `_2`, `_3`, ... (within the length limit) until the name is
/// unique, comparing case-insensitively as spreadsheet applications do.
pub fn unique_sheet_name(base: &str, used: &mut HashSet<String>) -> String {
    if used.insert(base.to_lowercase()) {
        return base.to_string();
    }
    let mut counter = 2usize;
    loop {
        let suffix = format!("_{counter}");
        let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
        let head: String = base.chars().take(keep).collect();
        let candidate = format!("{head}{suffix}");
        if used.insert(candidate.to_lowercase()) {
            return candidate;
        }
        counter += 1;
    }
}
