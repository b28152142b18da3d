//! Type coercion.
//!
//! Each [`ColumnType`] owns one conversion function:
//!
//! | Target     | Null / NaN input | Other input                              |
//! |------------|------------------|------------------------------------------|
//! | `string`   | `""`             | text rendering                           |
//! | `int`      | stays null       | truncated integer, or an error if not numeric |
//! | `float`    | `NaN`            | float, or an error if not numeric        |
//! | `datetime` | stays null       | parsed datetime, null when unparseable   |
//! | `object`   | unchanged        | unchanged                                |
//!
//! Applying the same spec to an already coerced table changes nothing.

use flatview_model::{CoercionSpec, ColumnType, Table, Value};
use tracing::{debug, info};

use crate::datetime::parse_datetime;
use crate::error::{Result, TransformError};

/// Converts one value; `None` means the value cannot be represented.
pub type Converter = fn(&Value) -> Option<Value>;

/// Conversion function for a coercion target.
pub fn converter(ty: ColumnType) -> Converter {
    match ty {
        ColumnType::String => to_string,
        ColumnType::Int => to_int,
        ColumnType::Float => to_float,
        ColumnType::DateTime => to_datetime,
        ColumnType::Object => keep,
    }
}

/// Cast every column of `table` to its target in `spec`.
///
/// Spec entries for columns the table lacks are ignored.
pub fn coerce(table: &Table, spec: &CoercionSpec) -> Result<Table> {
    let mut plan: Vec<(ColumnType, Converter)> = Vec::with_capacity(table.width());
    for column in table.columns() {
        let ty = spec
            .get(column)
            .ok_or_else(|| TransformError::MissingColumnType {
                column: column.clone(),
            })?;
        debug!(column = %column, target = %ty, "Coercing column");
        plan.push((ty, converter(ty)));
    }

    let mut rows = Vec::with_capacity(table.height());
    let mut nulled_dates = 0usize;
    for (row_idx, row) in table.rows().iter().enumerate() {
        let mut out = Vec::with_capacity(row.len());
        for (col_idx, value) in row.iter().enumerate() {
            let (ty, convert) = plan[col_idx];
            let converted = convert(value).ok_or_else(|| TransformError::InvalidValue {
                column: table.columns()[col_idx].clone(),
                row: row_idx,
                value: value.to_string(),
                target: ty,
            })?;
            if ty == ColumnType::DateTime && converted.is_null() && !value.is_null() {
                nulled_dates += 1;
            }
            out.push(converted);
        }
        rows.push(out);
    }

    info!(
        rows = table.height(),
        columns = table.width(),
        unparseable_dates = nulled_dates,
        "Coercion complete"
    );
    Ok(Table::from_rows(table.columns().to_vec(), rows)?)
}

fn keep(value: &Value) -> Option<Value> {
    Some(value.clone())
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Float(v) => v.is_nan(),
        _ => false,
    }
}

fn to_string(value: &Value) -> Option<Value> {
    if is_missing(value) {
        return Some(Value::String(String::new()));
    }
    Some(match value {
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    })
}

fn to_int(value: &Value) -> Option<Value> {
    if is_missing(value) {
        return Some(Value::Null);
    }
    match value {
        Value::Int(v) => Some(Value::Int(*v)),
        Value::Float(v) => float_to_int(*v),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(Value::Null);
            }
            trimmed
                .parse::<i64>()
                .ok()
                .map(Value::Int)
                .or_else(|| trimmed.parse::<f64>().ok().and_then(float_to_int))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_int(v: f64) -> Option<Value> {
    // Finite floats truncate toward zero; the i64 range bounds what fits.
    let truncated = v.trunc();
    if v.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(Value::Int(truncated as i64))
    } else {
        None
    }
}

fn to_float(value: &Value) -> Option<Value> {
    if is_missing(value) {
        return Some(Value::Float(f64::NAN));
    }
    match value {
        Value::Int(v) => Some(Value::Float(*v as f64)),
        Value::Float(v) => Some(Value::Float(*v)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(Value::Float(f64::NAN));
            }
            trimmed.parse::<f64>().ok().map(Value::Float)
        }
        _ => None,
    }
}

fn to_datetime(value: &Value) -> Option<Value> {
    Some(match value {
        Value::DateTime(dt) => Value::DateTime(*dt),
        Value::String(s) => parse_datetime(s).map_or(Value::Null, Value::DateTime),
        // Numbers, nested values and nulls have no date reading.
        _ => Value::Null,
    })
}
