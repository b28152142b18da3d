//! End-to-end migration scenarios against the in-memory store.

use flatview_core::{
    MigrationError, ViewAction, insert_collections, install_flatten_view, prepare, run_migration,
    run_verification,
};
use flatview_model::{MigrationConfig, Table, Value};
use flatview_store::{ADMIN_DATABASE, DocumentStore, MemoryStore};

const CONFIG: &str = r#"
source = "admissions.csv"

[store]
database = "healthcare"
main_collection = "admissions"
view = "flatten_view"

[columns]
name = "string"
age = "int"
gender = "string"
blood_type = "string"
hospital = "string"
billing_amount = "float"
date_of_admission = "datetime"

[[normalize]]
columns = "hospital"
new_column_name = "ref_hospital"
new_table_name = "hospitals"

[[serialize]]
columns = ["name", "gender", "blood_type"]
new_column_name = "patient"

[[roles]]
role = "analyst"
privileges = [
    { resource = { db = "healthcare", collection = "flatten_view" }, actions = ["find"] },
]
"#;

fn config() -> MigrationConfig {
    MigrationConfig::from_toml_str(CONFIG).unwrap()
}

fn admissions() -> Table {
    let columns = [
        "name",
        "age",
        "gender",
        "blood_type",
        "hospital",
        "billing_amount",
        "date_of_admission",
    ];
    let row = |name: &str, age: i64, gender: &str, blood: &str, hospital: &str, bill: f64, date: &str| {
        vec![
            Value::from(name),
            Value::Int(age),
            Value::from(gender),
            Value::from(blood),
            Value::from(hospital),
            Value::Float(bill),
            Value::from(date),
        ]
    };
    Table::from_rows(
        columns.iter().map(|c| (*c).to_string()).collect(),
        vec![
            row("Ann", 30, "Female", "O+", "General", 1200.5, "2024-01-31"),
            row("Bob", 62, "Male", "A-", "General", 310.0, "2023-11-02"),
            row("Cid", 45, "Male", "B+", "City", 99.25, "not a date"),
        ],
    )
    .unwrap()
}

#[test]
fn migration_writes_references_then_main() {
    let prepared = prepare(&admissions(), &config()).unwrap();
    let names: Vec<&str> = prepared.collections.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["hospitals", "admissions"]);

    let hospitals = &prepared.collections[0].documents;
    assert_eq!(hospitals.len(), 2);
    assert_eq!(hospitals[1].get("_id"), Some(&Value::Int(1)));
    assert_eq!(hospitals[1].get("hospital"), Some(&Value::from("City")));

    let Some(main) = prepared.main_collection() else {
        panic!("main collection missing");
    };
    insta::assert_json_snapshot!(main.documents[0], @r#"
    {
      "_id": 0,
      "age": 30,
      "billing_amount": 1200.5,
      "date_of_admission": {
        "$date": "2024-01-31T00:00:00"
      },
      "ref_hospital": 0,
      "patient": {
        "name": "Ann",
        "gender": "Female",
        "blood_type": "O+"
      }
    }
    "#);
    assert_eq!(main.documents[2].get("date_of_admission"), Some(&Value::Null));
}

#[test]
fn migration_round_trips_through_view() {
    let mut store = MemoryStore::new();
    let table = admissions();
    let summary = run_migration(&mut store, &table, &config()).unwrap();
    assert_eq!(summary.view_action, ViewAction::Created);
    assert_eq!(summary.collections[1].count, 3);
    assert_eq!(summary.roles, ["analyst"]);
    assert_eq!(store.roles(ADMIN_DATABASE).len(), 1);

    let report = run_verification(&store, &table, &config()).unwrap();
    assert!(report.is_clean(), "{report:#?}");
}

#[test]
fn second_migration_refuses_existing_database() {
    let mut store = MemoryStore::new();
    let table = admissions();
    run_migration(&mut store, &table, &config()).unwrap();
    let err = run_migration(&mut store, &table, &config()).unwrap_err();
    assert!(matches!(err, MigrationError::DatabaseExists { database } if database == "healthcare"));
}

#[test]
fn view_overwrite_requires_opt_in() {
    let mut store = MemoryStore::new();
    let config = config();
    run_migration(&mut store, &admissions(), &config).unwrap();
    let operations = config.operations();

    let err = install_flatten_view(&mut store, "healthcare", "flatten_view", "admissions", &operations, false)
        .unwrap_err();
    assert!(matches!(err, MigrationError::ViewExists { .. }));

    // Redefine the view without the serialization: the patient object stays nested.
    let action = install_flatten_view(
        &mut store,
        "healthcare",
        "flatten_view",
        "admissions",
        &operations[..1],
        true,
    )
    .unwrap();
    assert_eq!(action, ViewAction::Edited);
    let rows = store.find("healthcare", "flatten_view").unwrap();
    assert!(rows[0].get("name").is_none());
    assert!(rows[0].get("patient").is_some());
}

#[test]
fn view_requires_database() {
    let mut store = MemoryStore::new();
    let err = install_flatten_view(&mut store, "healthcare", "flatten_view", "admissions", &[], false)
        .unwrap_err();
    assert!(matches!(err, MigrationError::DatabaseNotFound { .. }));
}

#[test]
fn verification_requires_view() {
    let store = MemoryStore::new();
    let err = run_verification(&store, &admissions(), &config()).unwrap_err();
    assert!(matches!(
        err,
        MigrationError::Verify(flatview_verify::VerifyError::DatabaseNotFound { .. })
    ));
}

#[test]
fn dangling_reference_is_caught_by_verifier() {
    let config = config();
    let table = admissions();
    let mut prepared = prepare(&table, &config).unwrap();
    // Lose the "City" reference: its admission no longer survives the unwind.
    prepared.collections[0].documents.pop();

    let mut store = MemoryStore::new();
    insert_collections(&mut store, "healthcare", prepared.collections).unwrap();
    install_flatten_view(
        &mut store,
        "healthcare",
        "flatten_view",
        "admissions",
        &config.operations(),
        false,
    )
    .unwrap();

    let report = run_verification(&store, &table, &config).unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.value_report.expected_rows, 3);
    assert_eq!(report.value_report.actual_rows, 2);
    assert!(!report.type_report.is_clean());
}
