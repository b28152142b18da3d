//! Storage-side aggregation counting value types per field.
//!
//! Output: one document per field, sorted by field name:
//! `{"_id": "<field>", "types": [{"type": "<label>", "count": n}, ...]}`.

use crate::expr::{Accumulator, Expr, FieldMap, FieldPath, Projection, SortOrder};
use crate::stage::{Group, Pipeline, Stage};

pub fn type_count_pipeline() -> Pipeline {
    let mut explode = FieldMap::new();
    explode.insert(
        "kv",
        Projection::Expr(Expr::ObjectToArray(Box::new(Expr::Root))),
    );

    let mut label = FieldMap::new();
    label.insert("field", Projection::Expr(Expr::field("kv.k")));
    label.insert(
        "type",
        Projection::Expr(Expr::Type(Box::new(Expr::field("kv.v")))),
    );

    let per_pair = Group {
        id: Expr::Object(
            [("field", Expr::field("field")), ("type", Expr::field("type"))]
                .into_iter()
                .collect(),
        ),
        accumulators: [("count", Accumulator::Sum(Expr::Int(1)))]
            .into_iter()
            .collect(),
    };

    let per_field = Group {
        id: Expr::field("_id.field"),
        accumulators: [(
            "types",
            Accumulator::Push(Expr::Object(
                [
                    ("type", Expr::field("_id.type")),
                    ("count", Expr::field("count")),
                ]
                .into_iter()
                .collect(),
            )),
        )]
        .into_iter()
        .collect(),
    };

    let mut sort = FieldMap::new();
    sort.insert("_id", SortOrder::Ascending);

    Pipeline::new(vec![
        Stage::Project(explode),
        Stage::Unwind(FieldPath::new("kv")),
        Stage::Project(label),
        Stage::Group(per_pair),
        Stage::Group(per_field),
        Stage::Sort(sort),
    ])
}
