//! Header row location.
//!
//! Candidate rows are scored by a [`HeaderScorer`]; the best-scoring row
//! within the scan window wins, ties going to the earliest row.

use std::collections::HashSet;

use log::debug;

use crate::cell::Cell;
use crate::config::{HeaderOptions, HeaderWeights, ScorerKind};
use crate::loader::RawGrid;
use crate::text::normalize;

/// Scores how header-like a row is. `None` means the row has no filled
/// cell and can never be selected.
pub trait HeaderScorer {
    fn score(&self, row: &[Cell]) -> Option<f64>;
}

/// Counts gathered from one candidate row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowProfile {
    pub filled: usize,
    pub unique: usize,
    pub textual: usize,
}

impl RowProfile {
    pub fn of(row: &[Cell]) -> Self {
        let mut seen = HashSet::new();
        let mut profile = RowProfile::default();
        for cell in row {
            let value = normalize(cell);
            if value.is_empty() {
                continue;
            }
            profile.filled += 1;
            if cell.is_textual() {
                profile.textual += 1;
            }
            seen.insert(value);
        }
        profile.unique = seen.len();
        profile
    }
}

/// `filled*w.filled + unique*w.unique + textual*w.textual`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer {
    pub weights: HeaderWeights,
}

impl HeaderScorer for WeightedScorer {
    fn score(&self, row: &[Cell]) -> Option<f64> {
        let profile = RowProfile::of(row);
        if profile.filled == 0 {
            return None;
        }
        let w = &self.weights;
        Some(
            w.filled * profile.filled as f64
                + w.unique * profile.unique as f64
                + w.textual * profile.textual as f64,
        )
    }
}

/// Unweighted variant: the densest row wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillCountScorer;

impl HeaderScorer for FillCountScorer {
    fn score(&self, row: &[Cell]) -> Option<f64> {
        let filled = RowProfile::of(row).filled;
        (filled > 0).then_some(filled as f64)
    }
}

pub fn scorer_for(options: &HeaderOptions) -> Box<dyn HeaderScorer> {
    match options.scorer {
        ScorerKind::Weighted => Box::new(WeightedScorer {
            weights: options.weights,
        }),
        ScorerKind::FillCount => Box::new(FillCountScorer),
    }
}

/// Index of the most header-like row among the first `scan_rows` rows.
pub fn locate(grid: &RawGrid, scorer: &dyn HeaderScorer, scan_rows: usize) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for (idx, row) in grid.rows().iter().take(scan_rows).enumerate() {
        let Some(score) = scorer.score(row) else {
            continue;
        };
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((idx, score));
        }
    }
    match best {
        Some((idx, score)) => {
            debug!("Header row {idx} selected with score {score:.1}");
            idx
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::text(*v)).collect()
    }

    fn locate_default(grid: &RawGrid) -> usize {
        locate(grid, &WeightedScorer::default(), 25)
    }

    #[test]
    fn finds_header_below_blank_row() {
        let grid = RawGrid::from_rows(vec![
            text_row(&["", "", ""]),
            text_row(&["Name", "Email", "Amount"]),
            text_row(&["Alice", "a@x.com", "100"]),
        ]);
        assert_eq!(locate_default(&grid), 1);
    }

    #[test]
    fn numeric_rows_lose_to_text_header_of_equal_density() {
        let grid = RawGrid::from_rows(vec![
            text_row(&["Report 2567"]),
            vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)],
            text_row(&["id", "qty", "price"]),
            vec![Cell::Int(4), Cell::Int(5), Cell::Int(6)],
        ]);
        assert_eq!(locate_default(&grid), 2);
    }

    #[test]
    fn constant_rows_lose_to_distinct_values() {
        let grid = RawGrid::from_rows(vec![
            text_row(&["x", "x", "x"]),
            text_row(&["a", "b", "c"]),
        ]);
        assert_eq!(locate_default(&grid), 1);
    }

    #[test]
    fn ties_resolve_to_earliest_row() {
        let grid = RawGrid::from_rows(vec![text_row(&["a", "b"]), text_row(&["c", "d"])]);
        assert_eq!(locate_default(&grid), 0);
        assert_eq!(locate(&grid, &FillCountScorer, 25), 0);
    }

    #[test]
    fn empty_sample_defaults_to_zero() {
        let grid = RawGrid::from_rows(vec![text_row(&["", " "]), vec![Cell::Empty, Cell::Empty]]);
        assert_eq!(locate_default(&grid), 0);
    }

    #[test]
    fn rows_beyond_scan_window_are_ignored() {
        let mut rows = vec![text_row(&["title"])];
        rows.extend((0..30).map(|_| text_row(&[""])));
        rows.push(text_row(&["Name", "Email", "Amount"]));
        let grid = RawGrid::from_rows(rows);
        assert_eq!(locate_default(&grid), 0);
    }

    #[test]
    fn profile_counts_filled_unique_and_textual() {
        let row = vec![
            Cell::text("Name"),
            Cell::text("Name"),
            Cell::text("42"),
            Cell::Empty,
            Cell::Float(1.5),
        ];
        let profile = RowProfile::of(&row);
        assert_eq!(
            profile,
            RowProfile {
                filled: 4,
                unique: 3,
                textual: 2
            }
        );
        let score = WeightedScorer::default().score(&row).unwrap();
        assert_eq!(score, 2.0 * 4.0 + 1.5 * 3.0 + 2.0);
    }
}
