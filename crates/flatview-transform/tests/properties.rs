//! Property tests for coercion and normalization.

use std::collections::BTreeMap;

use flatview_model::{CoercionSpec, ColumnType, NormalizeOp, SerializeOp, Table, Value};
use flatview_transform::{coerce, normalize, serialize};
use proptest::prelude::*;

const COLUMNS: [&str; 5] = ["name", "age", "hospital", "billing_amount", "date_of_admission"];

fn spec() -> CoercionSpec {
    CoercionSpec::new()
        .with_column("name", ColumnType::String)
        .with_column("age", ColumnType::Int)
        .with_column("hospital", ColumnType::String)
        .with_column("billing_amount", ColumnType::Float)
        .with_column("date_of_admission", ColumnType::DateTime)
}

fn arb_raw_row() -> impl Strategy<Value = Vec<Value>> {
    (
        prop_oneof![Just(Value::Null), "[A-Za-z ]{0,8}".prop_map(Value::String)],
        prop_oneof![
            Just(Value::Null),
            (0i64..120).prop_map(Value::Int),
            (0i64..120).prop_map(|v| Value::String(v.to_string())),
        ],
        prop_oneof![Just("General"), Just("City"), Just("Mercy")].prop_map(Value::from),
        prop_oneof![
            Just(Value::Null),
            (-1.0e6f64..1.0e6).prop_map(Value::Float),
            (0i64..1000).prop_map(Value::Int),
        ],
        prop_oneof![
            Just(Value::Null),
            Just(Value::from("not a date")),
            (2000i32..2030, 1u32..13, 1u32..29)
                .prop_map(|(y, m, d)| Value::String(format!("{y:04}-{m:02}-{d:02}"))),
        ],
    )
        .prop_map(|(a, b, c, d, e)| vec![a, b, c, d, e])
}

fn arb_table() -> impl Strategy<Value = Table> {
    prop::collection::vec(arb_raw_row(), 0..24).prop_map(|rows| {
        Table::from_rows(COLUMNS.iter().map(|c| (*c).to_string()).collect(), rows)
            .expect("rows match the column count")
    })
}

proptest! {
    #[test]
    fn coercion_is_idempotent(raw in arb_table()) {
        let once = coerce(&raw, &spec()).unwrap();
        let twice = coerce(&once, &spec()).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn identities_are_deterministic(raw in arb_table()) {
        let typed = coerce(&raw, &spec()).unwrap();
        let op = NormalizeOp::new(["hospital", "age"], "ref_site", "sites");
        let first = normalize(&typed, &op).unwrap();
        let second = normalize(&typed, &op).unwrap();
        prop_assert_eq!(&first, &second);

        // First-seen order: identity n belongs to the n-th distinct tuple.
        let mut expected: BTreeMap<Vec<Value>, i64> = BTreeMap::new();
        for row in typed.rows() {
            let key = vec![row[2].clone(), row[1].clone()];
            let next = expected.len() as i64;
            expected.entry(key).or_insert(next);
        }
        for row in first.reference.rows() {
            let key = vec![row[1].clone(), row[2].clone()];
            let expected_id = expected.get(&key).map(|id| Value::Int(*id));
            prop_assert_eq!(Some(&row[0]), expected_id.as_ref());
        }
    }

    #[test]
    fn normalization_keeps_every_row(raw in arb_table()) {
        let typed = coerce(&raw, &spec()).unwrap();
        let op = NormalizeOp::new(["hospital"], "ref_hospital", "hospitals");
        let out = normalize(&typed, &op).unwrap();
        prop_assert_eq!(out.reduced.height(), typed.height());
        prop_assert!(out.reference.height() <= 3);
    }

    #[test]
    fn serialization_keeps_values(raw in arb_table()) {
        let typed = coerce(&raw, &spec()).unwrap();
        let op = SerializeOp::new(["name", "age"], "patient");
        let out = serialize(&typed, &op).unwrap();
        prop_assert_eq!(out.height(), typed.height());
        for (idx, row) in typed.rows().iter().enumerate() {
            let patient = out.get(idx, "patient").and_then(Value::as_document).unwrap();
            prop_assert_eq!(patient.get("name"), Some(&row[0]));
            prop_assert_eq!(patient.get("age"), Some(&row[1]));
        }
    }
}
