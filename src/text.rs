//! Cell text normalization.

use crate::cell::Cell;

/// Canonical string form of a cell. Missing values become `""`.
pub fn normalize(cell: &Cell) -> String {
    if cell.is_missing() {
        return String::new();
    }
    normalize_str(&cell.render())
}

/// Collapses line breaks, tabs and whitespace runs to single spaces, strips
/// other control characters and trims. Idempotent.
pub fn normalize_str(value: &str) -> String {
    let mut spaced = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\r' | '\n' | '\t' => spaced.push(' '),
            c if c.is_control() => {}
            c => spaced.push(c),
        }
    }
    let mut out = String::with_capacity(spaced.len());
    for word in spaced.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Whether a cell counts as empty for row filtering and header scoring.
pub fn is_blank(cell: &Cell) -> bool {
    cell.is_missing() || normalize(cell).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_line_breaks_and_runs() {
        assert_eq!(normalize_str("  Project\r\n\tName  (TH) "), "Project Name (TH)");
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(normalize_str("a\u{0007}b\u{001b}c"), "abc");
    }

    #[test]
    fn missing_cells_normalize_to_empty() {
        assert_eq!(normalize(&Cell::Empty), "");
        assert_eq!(normalize(&Cell::Error("#N/A".into())), "");
        assert_eq!(normalize(&Cell::Float(f64::NAN)), "");
    }

    #[test]
    fn non_breaking_space_counts_as_whitespace() {
        assert_eq!(normalize_str("\u{a0}ทุนวิจัย\u{a0}\u{a0}2567"), "ทุนวิจัย 2567");
    }

    #[test]
    fn blank_detection_covers_whitespace_only_text() {
        assert!(is_blank(&Cell::text(" \t ")));
        assert!(!is_blank(&Cell::Int(0)));
    }
}
