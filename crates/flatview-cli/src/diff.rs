//! CSV export of integrity differences.

use std::path::Path;

use anyhow::{Context, Result};
use flatview_verify::IntegrityReport;

const HEADER: [&str; 5] = ["check", "column", "detail", "expected", "actual"];

/// Write one line per difference; returns the number of lines written.
pub fn write_diff_csv(path: &Path, report: &IntegrityReport) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create diff file {}", path.display()))?;
    writer.write_record(HEADER)?;
    let mut lines = 0usize;

    for diff in &report.type_report.differences {
        writer.write_record([
            "type",
            diff.column.as_str(),
            diff.kind.as_str(),
            diff.expected.to_string().as_str(),
            diff.actual.to_string().as_str(),
        ])?;
        lines += 1;
    }

    let values = &report.value_report;
    for column in &values.missing_columns {
        writer.write_record(["column", column.as_str(), "missing from view", "", ""])?;
        lines += 1;
    }
    for column in &values.extra_columns {
        writer.write_record(["column", column.as_str(), "not in source", "", ""])?;
        lines += 1;
    }
    if values.expected_rows != values.actual_rows {
        writer.write_record([
            "rows",
            "",
            "row count",
            values.expected_rows.to_string().as_str(),
            values.actual_rows.to_string().as_str(),
        ])?;
        lines += 1;
    }
    for cell in &values.cells {
        writer.write_record([
            "cell",
            cell.column.as_str(),
            format!("row {}", cell.row).as_str(),
            cell.expected.to_string().as_str(),
            cell.actual.to_string().as_str(),
        ])?;
        lines += 1;
    }

    writer
        .flush()
        .with_context(|| format!("write diff file {}", path.display()))?;
    Ok(lines)
}
