//! Column serialization: several columns collapsed into one nested object.

use flatview_model::{Document, SerializeOp, Table, Value};
use tracing::info;

use crate::error::{Result, TransformError};

/// Replace `op.columns` with one object column named `op.new_column_name`.
///
/// The object keeps the listed column order; the new column is appended.
pub fn serialize(table: &Table, op: &SerializeOp) -> Result<Table> {
    let positions: Vec<usize> = op
        .columns
        .iter()
        .map(|column| {
            table
                .column_index(column)
                .ok_or_else(|| TransformError::MissingColumn {
                    column: column.clone(),
                    operation: op.to_string(),
                })
        })
        .collect::<Result<_>>()?;
    if table.column_index(&op.new_column_name).is_some() {
        return Err(TransformError::ColumnExists {
            column: op.new_column_name.clone(),
            operation: op.to_string(),
        });
    }

    let kept: Vec<usize> = (0..table.width())
        .filter(|i| !positions.contains(i))
        .collect();
    let mut columns: Vec<String> = kept.iter().map(|&i| table.columns()[i].clone()).collect();
    columns.push(op.new_column_name.clone());

    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let nested: Document = op
                .columns
                .iter()
                .zip(&positions)
                .map(|(name, &i)| (name.clone(), row[i].clone()))
                .collect();
            let mut out: Vec<Value> = kept.iter().map(|&i| row[i].clone()).collect();
            out.push(Value::Object(nested));
            out
        })
        .collect();

    info!(operation = %op, rows = table.height(), "Serialized columns");
    Ok(Table::from_rows(columns, rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patients() -> Table {
        Table::from_rows(
            ["name", "age", "gender", "blood_type"]
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
            vec![vec![
                Value::from("Ann"),
                Value::Int(30),
                Value::from("F"),
                Value::from("O+"),
            ]],
        )
        .unwrap()
    }

    #[test]
    fn test_serialize_patient() {
        let op = SerializeOp::new(["name", "gender", "blood_type"], "patient");
        let out = serialize(&patients(), &op).unwrap();

        assert_eq!(out.columns(), ["age", "patient"]);
        let patient = out.get(0, "patient").and_then(Value::as_document).unwrap();
        let keys: Vec<&str> = patient.keys().collect();
        assert_eq!(keys, ["name", "gender", "blood_type"]);
        assert_eq!(patient.get("blood_type"), Some(&Value::from("O+")));
    }

    #[test]
    fn test_missing_column() {
        let op = SerializeOp::new(["name", "email"], "patient");
        assert!(matches!(
            serialize(&patients(), &op),
            Err(TransformError::MissingColumn { column, .. }) if column == "email"
        ));
    }

    #[test]
    fn test_new_column_collision() {
        let op = SerializeOp::new(["name"], "age");
        assert!(matches!(
            serialize(&patients(), &op),
            Err(TransformError::ColumnExists { .. })
        ));
    }
}
