//! Integrity checks against views held by the in-memory store.

use flatview_model::{Document, Table, TypeMatchup, Value};
use flatview_pipeline::{FieldMap, Pipeline, Projection, Stage};
use flatview_store::{Command, DocumentStore, MemoryStore};
use flatview_verify::{VerifyError, check_type_integrity, verify};

fn admission(id: i64, age: i64, name: &str) -> Document {
    [
        ("_id".to_string(), Value::Int(id)),
        ("age".to_string(), Value::Int(age)),
        ("name".to_string(), Value::from(name)),
    ]
    .into_iter()
    .collect()
}

fn store_with_view() -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .insert_many(
            "healthcare",
            "admissions",
            vec![admission(0, 30, "Ann"), admission(1, 41, "Bob")],
        )
        .unwrap();
    let mut hide_id = FieldMap::new();
    hide_id.insert("_id", Projection::Exclude);
    let reply = store
        .run_command(
            "healthcare",
            &Command::Create {
                name: "flatten_view".to_string(),
                view_on: "admissions".to_string(),
                pipeline: Pipeline::new(vec![Stage::Project(hide_id)]),
            },
        )
        .unwrap();
    assert!(reply.is_ok());
    store
}

fn source(rows: Vec<Vec<Value>>) -> Table {
    Table::from_rows(vec!["age".to_string(), "name".to_string()], rows).unwrap()
}

#[test]
fn matching_view_is_clean() {
    let store = store_with_view();
    let expected = source(vec![
        vec![Value::Int(41), Value::from("Bob")],
        vec![Value::Int(30), Value::from("Ann")],
    ]);
    let report = verify(&store, "healthcare", "flatten_view", &expected, &TypeMatchup::default()).unwrap();
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.type_report.columns_checked, 2);
}

#[test]
fn diverging_view_is_reported() {
    let store = store_with_view();
    let expected = source(vec![
        vec![Value::Int(30), Value::from("Ann")],
        vec![Value::Null, Value::from("Bob")],
    ]);
    let report = verify(&store, "healthcare", "flatten_view", &expected, &TypeMatchup::default()).unwrap();
    assert!(!report.is_clean());
    insta::assert_json_snapshot!(report.type_report, @r#"
    {
      "columns_checked": 2,
      "differences": [
        {
          "column": "age",
          "kind": "null",
          "expected": 1,
          "actual": 0
        },
        {
          "column": "age",
          "kind": "int",
          "expected": 1,
          "actual": 2
        }
      ]
    }
    "#);
    assert_eq!(report.value_report.cell_difference_count, 4);
    assert_eq!(report.value_report.expected_rows, report.value_report.actual_rows);
}

#[test]
fn missing_database_and_view() {
    let store = store_with_view();
    let table = source(Vec::new());
    let matchup = TypeMatchup::default();

    let err = check_type_integrity(&store, "clinic", "flatten_view", &table, &matchup).unwrap_err();
    assert!(matches!(err, VerifyError::DatabaseNotFound { database } if database == "clinic"));

    let err = check_type_integrity(&store, "healthcare", "other_view", &table, &matchup).unwrap_err();
    assert!(matches!(err, VerifyError::ViewNotFound { view, .. } if view == "other_view"));

    // A plain collection is not a view.
    let err = check_type_integrity(&store, "healthcare", "admissions", &table, &matchup).unwrap_err();
    assert!(matches!(err, VerifyError::ViewNotFound { .. }));
}
