//! Polars value conversion.

use flatview_model::Value;
use polars::prelude::AnyValue;

/// Converts a polars `AnyValue` into a [`Value`].
///
/// Integers widen to `i64`; unsigned values beyond `i64::MAX` and booleans
/// are kept as text, as is any type the CSV reader does not infer by default.
pub fn any_to_value(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Int8(v) => Value::Int(i64::from(v)),
        AnyValue::Int16(v) => Value::Int(i64::from(v)),
        AnyValue::Int32(v) => Value::Int(i64::from(v)),
        AnyValue::Int64(v) => Value::Int(v),
        AnyValue::UInt8(v) => Value::Int(i64::from(v)),
        AnyValue::UInt16(v) => Value::Int(i64::from(v)),
        AnyValue::UInt32(v) => Value::Int(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).map_or_else(|_| Value::String(v.to_string()), Value::Int),
        AnyValue::Float32(v) => Value::Float(f64::from(v)),
        AnyValue::Float64(v) => Value::Float(v),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Boolean(b) => Value::String(b.to_string()),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_value_numbers() {
        assert_eq!(any_to_value(AnyValue::Int32(7)), Value::Int(7));
        assert_eq!(any_to_value(AnyValue::UInt64(u64::MAX)), Value::String(u64::MAX.to_string()));
        assert_eq!(any_to_value(AnyValue::Float64(2.5)), Value::Float(2.5));
        assert_eq!(any_to_value(AnyValue::Null), Value::Null);
    }

    #[test]
    fn test_any_to_value_text() {
        assert_eq!(any_to_value(AnyValue::String("O+")), Value::from("O+"));
        assert_eq!(any_to_value(AnyValue::Boolean(true)), Value::from("true"));
    }
}
