#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// Builds a workbook where each sheet is a grid of strings anchored at A1.
    /// Empty strings leave the cell blank; values parsing as `f64` are written
    /// as numbers.
    pub fn write_workbook(&self, name: &str, sheets: &[(&str, &[&[&str]])]) -> PathBuf {
        let path = self.join(name);
        let mut workbook = Workbook::new();
        for (sheet_name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*sheet_name).expect("sheet name");
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    let (r, c) = (r as u32, c as u16);
                    match value.parse::<f64>() {
                        Ok(number) => worksheet.write_number(r, c, number),
                        Err(_) => worksheet.write_string(r, c, *value),
                    }
                    .expect("write cell");
                }
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}

/// Rows reported by staff in the project registry exports: a title row, a
/// blank row, then the real header.
pub const REGISTRY_ROWS: &[&[&str]] = &[
    &["Research projects 2567", "", ""],
    &["", "", ""],
    &["Project", "Owner", "Budget"],
    &["Soil survey", "Somchai", "150000"],
    &["", "", ""],
    &["Water quality", "Malee", "98000.5"],
];
