//! Integrity reports.

use flatview_model::{Value, ValueKind};
use serde::Serialize;

/// Count mismatch for one (column, kind) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDifference {
    pub column: String,
    pub kind: ValueKind,
    /// Count in the source table.
    pub expected: u64,
    /// Count reported by the view.
    pub actual: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeIntegrityReport {
    pub columns_checked: usize,
    pub differences: Vec<TypeDifference>,
}

impl TypeIntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.differences.is_empty()
    }
}

/// One differing cell after both tables are put in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellDifference {
    /// Row position in canonical order, not the source row index.
    pub row: usize,
    pub column: String,
    pub expected: Value,
    pub actual: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValueIntegrityReport {
    /// Columns of the source table absent from the view.
    pub missing_columns: Vec<String>,
    /// Columns of the view absent from the source table.
    pub extra_columns: Vec<String>,
    pub expected_rows: usize,
    pub actual_rows: usize,
    /// Total differing cells; `cells` holds at most the first
    /// [`MAX_REPORTED_CELLS`](crate::MAX_REPORTED_CELLS) of them.
    pub cell_difference_count: usize,
    pub cells: Vec<CellDifference>,
}

impl ValueIntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.missing_columns.is_empty()
            && self.extra_columns.is_empty()
            && self.expected_rows == self.actual_rows
            && self.cell_difference_count == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub type_report: TypeIntegrityReport,
    pub value_report: ValueIntegrityReport,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.type_report.is_clean() && self.value_report.is_clean()
    }
}
