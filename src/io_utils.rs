//! I/O utilities: text decoding with encoding fallback, CSV reader/writer
//! construction and delimiter resolution.
//!
//! - **Encoding candidates**: labels resolve through `encoding_rs`; the
//!   pseudo-label `utf-8-sig` means UTF-8 with BOM removal. `tis-620` is an
//!   alias of `windows-874` and `latin1` of `windows-1252`.
//! - **Readers**: always headerless and flexible, so ragged rows survive and
//!   the header locator sees every row.
//! - **stdout**: writers without a path, or with `-`, go to standard output.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// One entry of the ordered encoding fallback list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingCandidate {
    pub encoding: &'static Encoding,
    pub strip_bom: bool,
}

impl EncodingCandidate {
    pub fn name(&self) -> &'static str {
        if self.strip_bom {
            "UTF-8-SIG"
        } else {
            self.encoding.name()
        }
    }

    /// Decodes the whole input, `None` when any byte sequence is malformed
    /// or unmapped in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        let (text, had_errors) = if self.strip_bom {
            self.encoding.decode_with_bom_removal(bytes)
        } else {
            self.encoding.decode_without_bom_handling(bytes)
        };
        if had_errors {
            None
        } else {
            Some(text.into_owned())
        }
    }
}

pub fn resolve_candidate(label: &str) -> Option<EncodingCandidate> {
    let normalized = label.trim().to_ascii_lowercase();
    if matches!(normalized.as_str(), "utf-8-sig" | "utf8-sig" | "utf_8_sig") {
        return Some(EncodingCandidate {
            encoding: UTF_8,
            strip_bom: true,
        });
    }
    Encoding::for_label(normalized.as_bytes()).map(|encoding| EncodingCandidate {
        encoding,
        strip_bom: false,
    })
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_input_delimiter(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{WINDOWS_1252, WINDOWS_874};

    #[test]
    fn thai_labels_resolve_to_windows_874() {
        assert_eq!(resolve_candidate("tis-620").unwrap().encoding, WINDOWS_874);
        assert_eq!(resolve_candidate("windows-874").unwrap().encoding, WINDOWS_874);
        assert_eq!(resolve_candidate("latin1").unwrap().encoding, WINDOWS_1252);
        assert!(resolve_candidate("cp-unknown").is_none());
    }

    #[test]
    fn utf8_sig_strips_bom() {
        let candidate = resolve_candidate("utf-8-sig").unwrap();
        assert_eq!(candidate.decode(b"\xEF\xBB\xBFName").as_deref(), Some("Name"));
        assert_eq!(candidate.decode(b"Name").as_deref(), Some("Name"));
    }

    #[test]
    fn invalid_utf8_fails_but_windows_874_decodes() {
        // "ชื่อ" in TIS-620
        let bytes = [0xAA, 0xD7, 0xE8, 0xCD];
        assert!(resolve_candidate("utf-8").unwrap().decode(&bytes).is_none());
        let decoded = resolve_candidate("windows-874").unwrap().decode(&bytes);
        assert_eq!(decoded.as_deref(), Some("ชื่อ"));
    }

    #[test]
    fn tsv_extension_selects_tab() {
        assert_eq!(resolve_input_delimiter(Path::new("a.TSV")), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv")), b',');
    }
}
