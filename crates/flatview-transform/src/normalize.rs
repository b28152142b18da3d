//! Column normalization.
//!
//! The distinct value tuples of the source columns become a reference table
//! keyed by `_id` (first-seen order, starting at 0). The source table is then
//! inner-joined against it: the source columns are dropped and the matched
//! identity is appended as the foreign-key column.

use std::collections::BTreeMap;

use flatview_model::{IDENTITY_FIELD, NormalizeOp, Table, Value};
use tracing::info;

use crate::error::{Result, TransformError};

/// Output of one normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// `_id` followed by the source columns, one row per distinct tuple.
    pub reference: Table,
    /// The input with the source columns replaced by the foreign key.
    pub reduced: Table,
}

pub fn normalize(table: &Table, op: &NormalizeOp) -> Result<Normalized> {
    let positions = source_positions(table, &op.columns, &op.to_string())?;
    if table.column_index(&op.new_column_name).is_some() {
        return Err(TransformError::ColumnExists {
            column: op.new_column_name.clone(),
            operation: op.to_string(),
        });
    }

    let reference = build_reference(table, &op.columns, &positions)?;
    let reduced = join_reference(table, &reference, &op.columns, &op.new_column_name)?;

    info!(
        operation = %op,
        collection = %op.new_table_name,
        distinct = reference.height(),
        rows = reduced.height(),
        "Normalized columns"
    );
    Ok(Normalized { reference, reduced })
}

/// Inner-join `table` with `reference` on `columns`.
///
/// `reference` must carry `_id` plus every column in `columns`. Rows whose
/// tuple has no reference entry are dropped; row order follows `table`.
pub fn join_reference(
    table: &Table,
    reference: &Table,
    columns: &[String],
    new_column_name: &str,
) -> Result<Table> {
    let label = format!("join on {}", columns.join(", "));
    let left = source_positions(table, columns, &label)?;
    let right = source_positions(reference, columns, &label)?;
    let id_idx = reference
        .column_index(IDENTITY_FIELD)
        .ok_or_else(|| TransformError::MissingColumn {
            column: IDENTITY_FIELD.to_string(),
            operation: label.clone(),
        })?;

    // Several reference rows may share a tuple; each one yields a joined row.
    let mut index: BTreeMap<Vec<Value>, Vec<Value>> = BTreeMap::new();
    for row in reference.rows() {
        let key: Vec<Value> = right.iter().map(|&i| row[i].clone()).collect();
        index.entry(key).or_default().push(row[id_idx].clone());
    }

    let kept: Vec<usize> = (0..table.width()).filter(|i| !left.contains(i)).collect();
    let mut out_columns: Vec<String> = kept.iter().map(|&i| table.columns()[i].clone()).collect();
    out_columns.push(new_column_name.to_string());

    let mut rows = Vec::with_capacity(table.height());
    for row in table.rows() {
        let key: Vec<Value> = left.iter().map(|&i| row[i].clone()).collect();
        let Some(ids) = index.get(&key) else {
            continue;
        };
        for id in ids {
            let mut out: Vec<Value> = kept.iter().map(|&i| row[i].clone()).collect();
            out.push(id.clone());
            rows.push(out);
        }
    }

    Ok(Table::from_rows(out_columns, rows)?)
}

fn build_reference(table: &Table, columns: &[String], positions: &[usize]) -> Result<Table> {
    let mut ref_columns = Vec::with_capacity(columns.len() + 1);
    ref_columns.push(IDENTITY_FIELD.to_string());
    ref_columns.extend(columns.iter().cloned());
    let mut reference = Table::new(ref_columns)?;

    let mut seen: BTreeMap<Vec<Value>, i64> = BTreeMap::new();
    for row in table.rows() {
        let key: Vec<Value> = positions.iter().map(|&i| row[i].clone()).collect();
        if seen.contains_key(&key) {
            continue;
        }
        let id = i64::try_from(seen.len()).unwrap_or(i64::MAX);
        let mut ref_row = Vec::with_capacity(key.len() + 1);
        ref_row.push(Value::Int(id));
        ref_row.extend(key.iter().cloned());
        reference.push_row(ref_row)?;
        seen.insert(key, id);
    }
    Ok(reference)
}

fn source_positions(table: &Table, columns: &[String], operation: &str) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|column| {
            table
                .column_index(column)
                .ok_or_else(|| TransformError::MissingColumn {
                    column: column.clone(),
                    operation: operation.to_string(),
                })
        })
        .collect()
}
