//! Descriptive columns appended to comparison tables.
//!
//! - 2 files: `Change` and `% Change` (second minus first)
//! - more than 2 files: `Mean` and `Std Dev` (sample, n-1)
//! - 1 file: nothing
//!
//! Every numeric cell is rounded to 3 decimals afterwards.

use crate::models::{Cell, ComparisonTable};

pub const CHANGE: &str = "Change";
pub const PERCENT_CHANGE: &str = "% Change";
pub const MEAN: &str = "Mean";
pub const STD_DEV: &str = "Std Dev";

/// Round to a fixed number of decimal places, ties to even.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation, `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Append the descriptive columns for `file_count` document columns.
///
/// The document columns must be the first `file_count` columns of the table.
pub fn append_descriptive_columns(table: &mut ComparisonTable, file_count: usize) {
    match file_count {
        2 => {
            table.columns.push(CHANGE.to_string());
            table.columns.push(PERCENT_CHANGE.to_string());
            for row in &mut table.rows {
                let (change, percent) = change_pair(
                    row.cells.first().and_then(Cell::as_number),
                    row.cells.get(1).and_then(Cell::as_number),
                );
                row.cells.push(change.into());
                row.cells.push(percent.into());
            }
        }
        n if n > 2 => {
            table.columns.push(MEAN.to_string());
            table.columns.push(STD_DEV.to_string());
            for row in &mut table.rows {
                let values: Vec<f64> = row
                    .cells
                    .iter()
                    .take(n)
                    .filter_map(Cell::as_number)
                    .collect();
                row.cells.push(mean(&values).map(|v| round_to(v, 3)).into());
                row.cells
                    .push(sample_std_dev(&values).map(|v| round_to(v, 3)).into());
            }
        }
        _ => {}
    }

    round_cells(table, 3);
}

/// `(Change, % Change)` for a baseline and follow-up value.
fn change_pair(first: Option<f64>, second: Option<f64>) -> (Option<f64>, Option<f64>) {
    let (Some(first), Some(second)) = (first, second) else {
        return (None, None);
    };
    let change = second - first;
    let percent = if first == 0.0 {
        None
    } else {
        Some(round_to(change / first * 100.0, 1))
    };
    (Some(round_to(change, 3)), percent)
}

fn round_cells(table: &mut ComparisonTable, places: i32) {
    for row in &mut table.rows {
        for cell in &mut row.cells {
            if let Cell::Number(v) = cell {
                *v = round_to(*v, places);
            }
        }
    }
}
