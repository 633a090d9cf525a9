//! Error types for spreadsheet ingestion.
//!
//! Only genuine unreadability is an error. A source that loads but holds no
//! data produces an empty [`CleanTable`](crate::clean::CleanTable) instead.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Every decoding/parsing strategy for the file failed.
    #[error("could not read {path}: {reason}")]
    UnreadableSource { path: PathBuf, reason: String },

    /// The repair pass recovered no worksheet from a broken container.
    #[error("could not repair {path}: {reason}")]
    RepairFailed { path: PathBuf, reason: String },

    /// A column mapping that cannot be applied to the table.
    #[error("invalid column mapping: {reason}")]
    InvalidMapping { reason: String },

    /// Configuration file missing or malformed.
    #[error("invalid configuration {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub(crate) fn unreadable(path: &Path, reason: impl Into<String>) -> Self {
        Self::UnreadableSource {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn repair_failed(path: &Path, reason: impl Into<String>) -> Self {
        Self::RepairFailed {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True when the repair pass may still rescue the source.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::UnreadableSource { .. })
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_source_display_names_path() {
        let err = IngestError::unreadable(Path::new("/uploads/projects.xlsx"), "bad zip");
        assert_eq!(
            err.to_string(),
            "could not read /uploads/projects.xlsx: bad zip"
        );
        assert!(err.is_unreadable());
    }

    #[test]
    fn repair_failed_is_not_unreadable() {
        let err = IngestError::repair_failed(Path::new("a.xlsx"), "no sheets");
        assert!(!err.is_unreadable());
        assert!(matches!(err, IngestError::RepairFailed { .. }));
    }
}
