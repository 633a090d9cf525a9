//! Plain-text rendering of a [`CleanTable`] for previews.

use std::fmt::Write as _;

use crate::clean::CleanTable;

/// Cells longer than this are cut and end with `…`.
pub const MAX_CELL_WIDTH: usize = 40;

pub fn render_table(table: &CleanTable) -> String {
    let mut headers = Vec::with_capacity(table.columns().len() + 1);
    headers.push("#".to_string());
    headers.extend(table.columns().iter().map(|c| clip(c)));

    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut cells = Vec::with_capacity(row.len() + 1);
            cells.push((idx + 1).to_string());
            cells.extend(row.iter().map(|c| clip(c)));
            cells
        })
        .collect();

    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(&headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

pub fn print_table(table: &CleanTable) {
    print!("{}", render_table(table));
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        line.push_str(value);
        let padding = widths[idx].saturating_sub(display_width(value));
        line.push_str(&" ".repeat(padding));
    }
    line.trim_end().to_string()
}

fn clip(value: &str) -> String {
    if display_width(value) <= MAX_CELL_WIDTH {
        return value.to_string();
    }
    let mut out = String::new();
    let mut width = 0usize;
    for ch in value.chars() {
        let w = char_width(ch);
        if width + w > MAX_CELL_WIDTH - 1 {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Terminal columns taken by `value`. Thai vowel and tone marks stack on
/// their base consonant and take none.
pub fn display_width(value: &str) -> usize {
    value.chars().map(char_width).sum()
}

fn char_width(ch: char) -> usize {
    match ch {
        '\u{0E31}' | '\u{0E34}'..='\u{0E3A}' | '\u{0E47}'..='\u{0E4E}' => 0,
        '\u{0300}'..='\u{036F}' | '\u{200B}'..='\u{200D}' => 0,
        _ => 1,
    }
}
