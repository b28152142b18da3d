//! End-to-end runs of the subcommands against a file-backed store.

use std::fs;
use std::path::{Path, PathBuf};

use flatview_cli::cli::{ConfigArgs, MigrateArgs, VerifyArgs};
use flatview_cli::commands::{run_migrate, run_pipeline, run_verify};
use tempfile::TempDir;

const CSV: &str = "\
Name,Age,Gender,Blood Type,Hospital,Billing Amount,Date of Admission
Bobby Jackson,30,Male,B-,Sons and Miller,18856.28,2024-01-31
Leslie Terry,62,Male,A+,Kim Inc,33643.33,2019-08-20
Danny Smith,76,Female,A-,Cook PLC,27955.1,2022-09-22
Andrew Watts,28,Female,O+,Kim Inc,37909.78,2020-11-18
";

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
"#;

fn write_fixture(dir: &Path) -> ConfigArgs {
    fs::write(dir.join("admissions.csv"), CSV).unwrap();
    let config = dir.join("migration.toml");
    fs::write(&config, CONFIG).unwrap();
    ConfigArgs {
        config,
        store: Some(format!("file://{}", dir.join("store.json").display())),
    }
}

#[test]
fn migrate_then_verify() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());

    let summary = run_migrate(&MigrateArgs {
        config: config.clone(),
        overwrite_view: false,
    })
    .unwrap();
    let counts: Vec<(&str, usize)> = summary
        .collections
        .iter()
        .map(|c| (c.name.as_str(), c.count))
        .collect();
    assert_eq!(counts, [("hospitals", 3), ("admissions", 4)]);

    let diff_out: PathBuf = dir.path().join("diff.csv");
    let report = run_verify(&VerifyArgs {
        config,
        diff_out: Some(diff_out.clone()),
    })
    .unwrap();
    assert!(report.is_clean(), "{report:#?}");
    let diff = fs::read_to_string(diff_out).unwrap();
    assert_eq!(diff.trim(), "check,column,detail,expected,actual");
}

#[test]
fn second_migrate_refuses_existing_database() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());
    let args = MigrateArgs {
        config,
        overwrite_view: true,
    };
    run_migrate(&args).unwrap();

    let err = run_migrate(&args).unwrap_err();
    assert!(format!("{err:#}").contains("database 'healthcare' already exists"));
}

#[test]
fn verify_without_migration_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());
    let err = run_verify(&VerifyArgs {
        config,
        diff_out: None,
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("does not exist"));
}

#[test]
fn pipeline_prints_wire_form() {
    let dir = TempDir::new().unwrap();
    let config = write_fixture(dir.path());
    let json = run_pipeline(&config).unwrap();
    assert!(json.starts_with('['));
    assert!(json.contains(r#""$unwind": "$hospitalsDocs""#));
    assert!(json.contains(r#""name": "$patient.name""#));
}

#[test]
fn unsupported_store_uri() {
    let dir = TempDir::new().unwrap();
    let mut config = write_fixture(dir.path());
    config.store = Some("redis://localhost:6379".to_string());
    let err = run_migrate(&MigrateArgs {
        config,
        overwrite_view: false,
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("unsupported store uri"));
}
