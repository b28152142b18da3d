//! Value integrity.
//!
//! Both tables are reduced to their shared columns in name order and their
//! rows sorted by the full tuple, so row order and column order never count
//! as differences.

use std::collections::BTreeSet;

use flatview_model::{Table, Value};
use flatview_store::DocumentStore;
use tracing::info;

use crate::error::Result;
use crate::report::{CellDifference, ValueIntegrityReport};

/// Cap on the cell differences a report keeps.
pub const MAX_REPORTED_CELLS: usize = 1000;

pub fn compare_tables(expected: &Table, actual: &Table) -> ValueIntegrityReport {
    let expected_columns: BTreeSet<&str> = expected.columns().iter().map(String::as_str).collect();
    let actual_columns: BTreeSet<&str> = actual.columns().iter().map(String::as_str).collect();
    let common: Vec<&str> = expected_columns.intersection(&actual_columns).copied().collect();

    let mut report = ValueIntegrityReport {
        expected_rows: expected.height(),
        actual_rows: actual.height(),
        ..ValueIntegrityReport::default()
    };
    // An empty view has no observable columns; the row count covers it.
    if actual.width() > 0 {
        report.missing_columns = expected_columns
            .difference(&actual_columns)
            .map(|c| (*c).to_string())
            .collect();
        report.extra_columns = actual_columns
            .difference(&expected_columns)
            .map(|c| (*c).to_string())
            .collect();
    }

    let left = canonical_rows(expected, &common);
    let right = canonical_rows(actual, &common);
    for (row, (left_row, right_row)) in left.iter().zip(&right).enumerate() {
        for ((column, expected), actual) in common.iter().zip(left_row).zip(right_row) {
            if expected == actual {
                continue;
            }
            report.cell_difference_count += 1;
            if report.cells.len() < MAX_REPORTED_CELLS {
                report.cells.push(CellDifference {
                    row,
                    column: (*column).to_string(),
                    expected: expected.clone(),
                    actual: actual.clone(),
                });
            }
        }
    }
    report
}

fn canonical_rows(table: &Table, columns: &[&str]) -> Vec<Vec<Value>> {
    let indices: Vec<usize> = columns.iter().filter_map(|c| table.column_index(c)).collect();
    let mut rows: Vec<Vec<Value>> = table
        .rows()
        .iter()
        .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
        .collect();
    rows.sort();
    rows
}

/// Read every document of `view` and compare it with `expected`.
pub fn check_value_integrity(
    store: &dyn DocumentStore,
    database: &str,
    view: &str,
    expected: &Table,
) -> Result<ValueIntegrityReport> {
    crate::ensure_view(store, database, view)?;

    let documents = store.find(database, view)?;
    let actual = Table::from_documents(&documents);
    let report = compare_tables(expected, &actual);

    info!(
        database,
        view,
        expected_rows = report.expected_rows,
        actual_rows = report.actual_rows,
        cell_differences = report.cell_difference_count,
        "Value integrity checked"
    );
    Ok(report)
}
