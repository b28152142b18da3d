//! Type integrity.
//!
//! Compares, per column, how many values of each [`ValueKind`] the source
//! table holds against the storage type counts the view reports. Storage
//! labels are translated through a [`TypeMatchup`] first, so `int` and
//! `long` both count as [`ValueKind::Int`].

use std::collections::{BTreeMap, BTreeSet};

use flatview_model::{Document, StoreType, Table, TypeMatchup, Value, ValueKind};
use flatview_pipeline::type_count_pipeline;
use flatview_store::DocumentStore;
use tracing::{debug, info};

use crate::error::{Result, VerifyError};
use crate::report::{TypeDifference, TypeIntegrityReport};

/// Column name to per-kind value counts.
pub type KindCounts = BTreeMap<String, BTreeMap<ValueKind, u64>>;

/// Runtime kinds observed in a table.
pub fn table_kind_counts(table: &Table) -> KindCounts {
    let mut counts = KindCounts::new();
    for column in table.columns() {
        let per_kind = counts.entry(column.clone()).or_default();
        if let Some(values) = table.column_values(column) {
            for value in values {
                *per_kind.entry(value.kind()).or_default() += 1;
            }
        }
    }
    counts
}

/// Translate the output of [`type_count_pipeline`] into kind counts.
pub fn store_kind_counts(documents: &[Document], matchup: &TypeMatchup) -> Result<KindCounts> {
    let mut counts = KindCounts::new();
    for doc in documents {
        let field = doc
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(format!("missing field name in {doc}")))?;
        let types = doc
            .get("types")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed(format!("missing types for field '{field}'")))?;

        let per_kind = counts.entry(field.to_string()).or_default();
        for entry in types {
            let label = entry
                .as_document()
                .and_then(|e| e.get("type"))
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(format!("missing type label for field '{field}'")))?;
            let count = entry
                .as_document()
                .and_then(|e| e.get("count"))
                .and_then(Value::as_i64)
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| malformed(format!("invalid count for '{field}' ({label})")))?;
            let kind = StoreType::from_label(label)
                .and_then(|store_type| matchup.lookup(store_type))
                .ok_or_else(|| VerifyError::UnmappedStoreType {
                    field: field.to_string(),
                    label: label.to_string(),
                })?;
            *per_kind.entry(kind).or_default() += count;
        }
    }
    Ok(counts)
}

fn malformed(reason: String) -> VerifyError {
    VerifyError::MalformedTypeCount { reason }
}

/// Align both sides by column and kind; absent entries count as zero.
pub fn compare_kind_counts(expected: &KindCounts, actual: &KindCounts) -> TypeIntegrityReport {
    let columns: BTreeSet<&String> = expected.keys().chain(actual.keys()).collect();
    let empty = BTreeMap::new();
    let mut differences = Vec::new();

    for column in &columns {
        let left = expected.get(*column).unwrap_or(&empty);
        let right = actual.get(*column).unwrap_or(&empty);
        let kinds: BTreeSet<ValueKind> = left.keys().chain(right.keys()).copied().collect();
        for kind in kinds {
            let expected_count = left.get(&kind).copied().unwrap_or(0);
            let actual_count = right.get(&kind).copied().unwrap_or(0);
            if expected_count != actual_count {
                differences.push(TypeDifference {
                    column: (*column).clone(),
                    kind,
                    expected: expected_count,
                    actual: actual_count,
                });
            }
        }
    }

    TypeIntegrityReport {
        columns_checked: columns.len(),
        differences,
    }
}

/// Run the type count aggregation on `view` and compare it with `expected`.
pub fn check_type_integrity(
    store: &dyn DocumentStore,
    database: &str,
    view: &str,
    expected: &Table,
    matchup: &TypeMatchup,
) -> Result<TypeIntegrityReport> {
    crate::ensure_view(store, database, view)?;

    let documents = store.aggregate(database, view, &type_count_pipeline())?;
    debug!(database, view, fields = documents.len(), "Collected storage type counts");
    let actual = store_kind_counts(&documents, matchup)?;
    let report = compare_kind_counts(&table_kind_counts(expected), &actual);

    info!(
        database,
        view,
        columns = report.columns_checked,
        differences = report.differences.len(),
        "Type integrity checked"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_doc(field: &str, types: &[(&str, i64)]) -> Document {
        let types = types
            .iter()
            .map(|(label, count)| {
                let entry: Document = [
                    ("type".to_string(), Value::from(*label)),
                    ("count".to_string(), Value::Int(*count)),
                ]
                .into_iter()
                .collect();
                Value::Object(entry)
            })
            .collect();
        [
            ("_id".to_string(), Value::from(field)),
            ("types".to_string(), Value::Array(types)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_int_and_long_merge() {
        let docs = vec![type_doc("age", &[("int", 3), ("long", 2)])];
        let counts = store_kind_counts(&docs, &TypeMatchup::default()).unwrap();
        assert_eq!(counts["age"][&ValueKind::Int], 5);
    }

    #[test]
    fn test_unmapped_label() {
        let docs = vec![type_doc("flag", &[("bool", 1)])];
        let err = store_kind_counts(&docs, &TypeMatchup::default()).unwrap_err();
        assert!(matches!(err, VerifyError::UnmappedStoreType { ref label, .. } if label == "bool"));
    }

    #[test]
    fn test_missing_column_counts_as_zero() {
        let expected = KindCounts::from([(
            "age".to_string(),
            BTreeMap::from([(ValueKind::Int, 2)]),
        )]);
        let report = compare_kind_counts(&expected, &KindCounts::new());
        assert_eq!(
            report.differences,
            [TypeDifference {
                column: "age".to_string(),
                kind: ValueKind::Int,
                expected: 2,
                actual: 0,
            }]
        );
    }
}
