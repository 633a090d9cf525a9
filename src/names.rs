//! Field name derivation from a located header row.

use std::collections::{HashMap, HashSet};

use crate::cell::Cell;
use crate::text::normalize;

/// Base name for placeholder headers; the 1-based column position is appended.
pub const PLACEHOLDER_PREFIX: &str = "Field";

/// Blank, `nan`, or a library-generated `Unnamed: n` marker.
pub fn is_placeholder(name: &str) -> bool {
    name.is_empty() || name.eq_ignore_ascii_case("nan") || name.to_lowercase().contains("unnamed")
}

/// One unique, non-empty field name per header cell, in order.
pub fn build_names(header: &[Cell]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(header.len());
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(header.len());

    for (idx, cell) in header.iter().enumerate() {
        let normalized = normalize(cell);
        let base = if is_placeholder(&normalized) {
            format!("{PLACEHOLDER_PREFIX}_{}", idx + 1)
        } else {
            normalized
        };

        let seen = occurrences.entry(base.clone()).or_insert(0);
        *seen += 1;
        let mut candidate = if *seen == 1 {
            base.clone()
        } else {
            format!("{base}_{seen}")
        };
        // A suffixed name can collide with a later literal header, or the
        // base itself with an earlier suffix; keep counting until free.
        let mut counter = (*seen).max(1);
        while used.contains(&candidate) {
            counter += 1;
            candidate = format!("{base}_{counter}");
        }
        used.insert(candidate.clone());
        names.push(candidate);
    }
    names
}
