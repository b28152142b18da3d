//! Loading and standardising a source CSV end to end.

use std::io::Write;

use flatview_ingest::{load_table, standardise_column_names};
use flatview_model::Value;
use tempfile::NamedTempFile;

const ADMISSIONS: &str = "\
Name,Age,Gender,Blood Type,Hospital,Billing Amount,Date of Admission
Bobby Jackson,30,Male,B-,Sons and Miller,18856.281305978155,2024-01-31
LesLie TErRy,62,Male,A+,Kim Inc,33643.327286577885,2019-08-20
Danny Smith,76,Female,A-,Sons and Miller,27955.096078842456,2022-09-22
";

#[test]
fn test_load_and_standardise() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(ADMISSIONS.as_bytes()).unwrap();

    let table = standardise_column_names(load_table(file.path()).unwrap()).unwrap();

    assert_eq!(
        table.columns(),
        [
            "name",
            "age",
            "gender",
            "blood_type",
            "hospital",
            "billing_amount",
            "date_of_admission"
        ]
    );
    assert_eq!(table.height(), 3);
    assert_eq!(table.get(2, "hospital"), Some(&Value::from("Sons and Miller")));
    assert_eq!(table.get(1, "age"), Some(&Value::Int(62)));
    // Dates stay textual until coercion.
    assert_eq!(
        table.get(0, "date_of_admission"),
        Some(&Value::from("2024-01-31"))
    );
}
