//! Permissive date parsing into `YYYY-MM-DD`.
//!
//! Unparseable input yields an empty string so one bad cell never blocks an
//! import. Years above 2400 are taken as Buddhist Era and shifted by 543
//! before the date is built, so BE leap days such as 29/02/2567 resolve.

use std::sync::OnceLock;

use chrono::NaiveDate;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const BUDDHIST_ERA_OFFSET: i32 = 543;
pub const BUDDHIST_ERA_THRESHOLD: i32 = 2400;

/// Reading of ambiguous numeric dates such as `01/02/2024`. A component
/// above 12 always forces the other reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum DateOrder {
    #[default]
    DayFirst,
    MonthFirst,
}

const ENGLISH_MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const THAI_MONTHS: &[&str] = &[
    "มกราคม", "กุมภาพันธ์", "มีนาคม", "เมษายน", "พฤษภาคม", "มิถุนายน", "กรกฎาคม", "สิงหาคม",
    "กันยายน", "ตุลาคม", "พฤศจิกายน", "ธันวาคม",
];

// Abbreviations with their dots removed (ม.ค. -> มค).
const THAI_MONTH_ABBREVIATIONS: &[&str] = &[
    "มค", "กพ", "มีค", "เมย", "พค", "มิย", "กค", "สค", "กย", "ตค", "พย", "ธค",
];

struct Patterns {
    time_suffix: Regex,
    year_first: Regex,
    numeric: Regex,
    compact: Regex,
    day_month_name: Regex,
    month_name_day: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let build = |pattern: &str| Regex::new(pattern).expect("static date pattern");
        Patterns {
            time_suffix: build(
                r"^(.*?)[\sT,]+\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?\s*(?:[AaPp]\.?[Mm]\.?)?\s*(?:Z|[+-]\d{2}:?\d{2})?$",
            ),
            year_first: build(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})$"),
            numeric: build(r"^(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})$"),
            compact: build(r"^(\d{4})(\d{2})(\d{2})$"),
            day_month_name: build(
                r"^(\d{1,2})(?:st|nd|rd|th)?[\s\-/.,]*([^\d\s\-/,]+)[\s\-/.,]*(\d{4}|\d{2})$",
            ),
            month_name_day: build(
                r"^([^\d\s\-/,]+)[\s\-/.,]*(\d{1,2})(?:st|nd|rd|th)?[\s\-/.,]*(\d{4})$",
            ),
        }
    })
}

/// `YYYY-MM-DD` for any recognizable date, `""` otherwise.
pub fn parse_date(value: &str, order: DateOrder) -> String {
    parse_naive_date(value, order)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn parse_naive_date(value: &str, order: DateOrder) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let p = patterns();
    let date_part = p
        .time_suffix
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str().trim());

    let (year, month, day) = if let Some(caps) = p.year_first.captures(date_part) {
        (num(&caps[1])?, num(&caps[2])?, num(&caps[3])?)
    } else if let Some(caps) = p.compact.captures(date_part) {
        (num(&caps[1])?, num(&caps[2])?, num(&caps[3])?)
    } else if let Some(caps) = p.numeric.captures(date_part) {
        let (first, second) = (num(&caps[1])?, num(&caps[2])?);
        let (day, month) = resolve_day_month(first, second, order);
        (expand_year(&caps[3], false)?, month, day)
    } else if let Some(caps) = p.day_month_name.captures(date_part) {
        let (month, thai) = month_from_name(&caps[2])?;
        (expand_year(&caps[3], thai)?, month, num(&caps[1])?)
    } else if let Some(caps) = p.month_name_day.captures(date_part) {
        let (month, _) = month_from_name(&caps[1])?;
        (num(&caps[3])?, month, num(&caps[2])?)
    } else {
        return None;
    };

    let year = i32::try_from(year).ok()?;
    let year = if year > BUDDHIST_ERA_THRESHOLD {
        year - BUDDHIST_ERA_OFFSET
    } else {
        year
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn num(digits: &str) -> Option<u32> {
    digits.parse().ok()
}

fn resolve_day_month(first: u32, second: u32, order: DateOrder) -> (u32, u32) {
    match order {
        _ if first > 12 => (first, second),
        _ if second > 12 => (second, first),
        DateOrder::DayFirst => (first, second),
        DateOrder::MonthFirst => (second, first),
    }
}

/// Two-digit years: `00-68` -> 2000s, `69-99` -> 1900s, or the 2500s of the
/// Buddhist Era when the month was written in Thai.
fn expand_year(digits: &str, buddhist: bool) -> Option<u32> {
    let value = num(digits)?;
    if digits.len() != 2 {
        return Some(value);
    }
    Some(match (buddhist, value) {
        (true, yy) => 2500 + yy,
        (false, yy) if yy < 69 => 2000 + yy,
        (false, yy) => 1900 + yy,
    })
}

/// Month number and whether the name was Thai.
fn month_from_name(token: &str) -> Option<(u32, bool)> {
    let compact: String = token.chars().filter(|c| *c != '.').collect();
    let lowered = compact.to_lowercase();
    if lowered.is_ascii() {
        if lowered.len() < 3 {
            return None;
        }
        let idx = ENGLISH_MONTHS
            .iter()
            .position(|name| *name == lowered || (name.starts_with(&lowered) && lowered.len() <= 4))?;
        return Some((idx as u32 + 1, false));
    }
    THAI_MONTHS
        .iter()
        .position(|name| *name == compact)
        .or_else(|| THAI_MONTH_ABBREVIATIONS.iter().position(|abbr| *abbr == compact))
        .map(|idx| (idx as u32 + 1, true))
}
