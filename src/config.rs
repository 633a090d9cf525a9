//! Tunable ingestion options, loadable from YAML.
//!
//! ```yaml
//! header:
//!   scan_rows: 25
//!   scorer: weighted
//!   weights: { filled: 2.0, unique: 1.5, textual: 1.0 }
//! dates:
//!   order: day-first
//! csv:
//!   encodings: [utf-8-sig, windows-874, utf-8, latin1]
//! repair:
//!   enabled: true
//! ```

use std::{fs::File, io::BufReader, path::Path};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::dates::DateOrder;
use crate::error::{IngestError, Result};
use crate::io_utils;

pub const DEFAULT_SCAN_ROWS: usize = 25;
pub const DEFAULT_ENCODINGS: &[&str] = &["utf-8-sig", "windows-874", "utf-8", "latin1"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    pub header: HeaderOptions,
    pub dates: DateOptions,
    pub csv: CsvOptions,
    pub repair: RepairOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderOptions {
    pub scan_rows: usize,
    pub scorer: ScorerKind,
    pub weights: HeaderWeights,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            scan_rows: DEFAULT_SCAN_ROWS,
            scorer: ScorerKind::default(),
            weights: HeaderWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum ScorerKind {
    #[default]
    Weighted,
    /// Non-empty cell count only.
    FillCount,
}

/// Weights of the header score `filled*f + unique*u + textual*t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderWeights {
    pub filled: f64,
    pub unique: f64,
    pub textual: f64,
}

impl Default for HeaderWeights {
    fn default() -> Self {
        Self {
            filled: 2.0,
            unique: 1.5,
            textual: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateOptions {
    pub order: DateOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub encodings: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            encodings: DEFAULT_ENCODINGS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairOptions {
    pub enabled: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl IngestOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
        let options: IngestOptions =
            serde_yaml::from_reader(BufReader::new(file)).map_err(|e| IngestError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        options.validate(path)?;
        Ok(options)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| IngestError::Config {
            path: path.to_path_buf(),
            reason,
        };
        if self.header.scan_rows == 0 {
            return Err(invalid("header.scan_rows must be at least 1".into()));
        }
        if self.csv.encodings.is_empty() {
            return Err(invalid("csv.encodings must list at least one encoding".into()));
        }
        for label in &self.csv.encodings {
            if io_utils::resolve_candidate(label).is_none() {
                return Err(invalid(format!("unknown encoding '{label}'")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_documented_weights() {
        let options = IngestOptions::default();
        assert_eq!(options.header.scan_rows, 25);
        assert_eq!(options.header.weights.filled, 2.0);
        assert_eq!(options.header.weights.unique, 1.5);
        assert_eq!(options.header.weights.textual, 1.0);
        assert_eq!(options.dates.order, DateOrder::DayFirst);
        assert!(options.repair.enabled);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "header:\n  scan_rows: 10\ndates:\n  order: month-first").unwrap();

        let options = IngestOptions::load(file.path()).expect("load options");
        assert_eq!(options.header.scan_rows, 10);
        assert_eq!(options.header.scorer, ScorerKind::Weighted);
        assert_eq!(options.dates.order, DateOrder::MonthFirst);
        assert_eq!(options.csv.encodings.len(), DEFAULT_ENCODINGS.len());
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "csv:\n  encodings: [klingon]").unwrap();

        let err = IngestOptions::load(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::Config { .. }));
        assert!(err.to_string().contains("klingon"));
    }
}
