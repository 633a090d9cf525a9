//! Raw cell values as they come out of a spreadsheet or CSV reader.

use std::borrow::Cow;
use std::fmt;

use calamine::Data;
use chrono::{NaiveDateTime, Timelike};

/// One cell of a [`RawGrid`](crate::loader::RawGrid).
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Spreadsheet error value such as `#DIV/0!`; treated as missing.
    Error(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Missing, NaN or error markers. Whitespace-only text is not missing
    /// here; it only becomes empty after normalization.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty | Cell::Error(_) => true,
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Text cells that do not read as a number. CSV sources carry no native
    /// types, so numeric-looking text counts as numeric.
    pub fn is_textual(&self) -> bool {
        match self {
            Cell::Text(s) => {
                let trimmed = s.trim();
                !trimmed.is_empty() && !looks_numeric(trimmed)
            }
            _ => false,
        }
    }

    /// Unnormalized string form of the cell.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty | Cell::Error(_) => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
            Cell::Int(i) => Cow::Owned(i.to_string()),
            Cell::Float(f) => Cow::Owned(render_float(*f)),
            Cell::Bool(b) => Cow::Owned(b.to_string()),
            Cell::DateTime(dt) => Cow::Owned(render_datetime(dt)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => {
                if dt.is_duration() {
                    Cell::Float(dt.as_f64())
                } else {
                    dt.as_datetime()
                        .map(Cell::DateTime)
                        .unwrap_or_else(|| Cell::Float(dt.as_f64()))
                }
            }
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Error(e.to_string()),
        }
    }
}

pub(crate) fn looks_numeric(value: &str) -> bool {
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let compact: String = value.chars().filter(|c| *c != ',').collect();
    compact.parse::<f64>().is_ok()
}

fn render_float(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn render_datetime(value: &NaiveDateTime) -> String {
    if value.time().num_seconds_from_midnight() == 0 && value.time().nanosecond() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
