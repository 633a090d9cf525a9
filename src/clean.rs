//! The clean output table and its materialization from a raw grid.

use std::collections::HashMap;

use log::debug;
use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};

use crate::loader::RawGrid;
use crate::text::{is_blank, normalize};

/// Ordered field names plus rows of normalized, never-null strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CleanTable {
    /// Builds a table, padding or truncating each row to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows. This is the "no data" outcome, not
    /// a failure.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// One row as a field-name keyed record.
    pub fn record(&self, row: usize) -> Option<HashMap<&str, &str>> {
        let values = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(values.iter().map(String::as_str))
                .collect(),
        )
    }

    /// First `limit` rows, for operator previews.
    pub fn head(&self, limit: usize) -> CleanTable {
        CleanTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(limit).cloned().collect(),
        }
    }
}

struct RowRecord<'a> {
    columns: &'a [String],
    values: &'a [String],
}

impl Serialize for RowRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl Serialize for CleanTable {
    /// `{"columns": [...], "rows": [{column: value}, ...]}` in column order.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let records: Vec<RowRecord<'_>> = self
            .rows
            .iter()
            .map(|values| RowRecord {
                columns: &self.columns,
                values,
            })
            .collect();
        let mut state = serializer.serialize_struct("CleanTable", 2)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("rows", &records)?;
        state.end()
    }
}

/// Rows strictly below `header_index`, labelled by position with `names`,
/// fully blank rows dropped and every cell normalized.
pub fn materialize(grid: &RawGrid, header_index: usize, names: &[String]) -> CleanTable {
    let width = names.len();
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for raw in grid.rows().iter().skip(header_index + 1) {
        let cells = &raw[..raw.len().min(width)];
        if cells.iter().all(is_blank) {
            dropped += 1;
            continue;
        }
        let mut row: Vec<String> = cells.iter().map(normalize).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    if dropped > 0 {
        debug!("Dropped {dropped} empty row(s) below the header");
    }
    CleanTable {
        columns: names.to_vec(),
        rows,
    }
}
