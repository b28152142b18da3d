//! Flattening pipeline generator.
//!
//! Replays the recorded operations to derive the read path that rebuilds the
//! flat table from normalized storage:
//!
//! 1. per normalization, a `$lookup` into `<new_table_name>Docs` and an
//!    `$unwind` of that array
//! 2. one `$addFields` restoring every source column from the looked-up
//!    document or the serialized object (omitted when there is none)
//! 3. a final `$project` dropping `_id`, the temporary arrays, the foreign
//!    keys and the serialized objects
//!
//! The output depends only on the operations, never on the data.

use flatview_model::{IDENTITY_FIELD, NormalizeOp, Operation, SerializeOp};
pub use flatview_model::LOOKUP_SUFFIX;

use crate::expr::{Expr, FieldMap, FieldPath, Projection};
use crate::stage::{Lookup, Pipeline, Stage};

/// Build the flattening pipeline from an operation list.
///
/// Normalizations are replayed first, then serializations, each group in
/// list order.
pub fn build_flattening_pipeline(operations: &[Operation]) -> Pipeline {
    let normalizations: Vec<NormalizeOp> = operations
        .iter()
        .filter_map(|op| match op {
            Operation::Normalize(n) => Some(n.clone()),
            Operation::Serialize(_) => None,
        })
        .collect();
    let serializations: Vec<SerializeOp> = operations
        .iter()
        .filter_map(|op| match op {
            Operation::Serialize(s) => Some(s.clone()),
            Operation::Normalize(_) => None,
        })
        .collect();
    build_pipeline(&normalizations, &serializations)
}

pub fn build_pipeline(normalizations: &[NormalizeOp], serializations: &[SerializeOp]) -> Pipeline {
    let mut pipeline = Pipeline::default();
    let mut add_fields: FieldMap<Expr> = FieldMap::new();
    let mut project: FieldMap<Projection> = FieldMap::new();
    project.insert(IDENTITY_FIELD, Projection::Exclude);

    for op in normalizations {
        let docs = op.lookup_field();
        pipeline.push(Stage::Lookup(Lookup {
            from: op.new_table_name.clone(),
            local_field: op.new_column_name.clone(),
            foreign_field: IDENTITY_FIELD.to_string(),
            as_field: docs.clone(),
        }));
        pipeline.push(Stage::Unwind(FieldPath::new(docs.clone())));

        project.insert(docs.clone(), Projection::Exclude);
        project.insert(op.new_column_name.clone(), Projection::Exclude);

        for column in &op.columns {
            add_fields.insert(column.clone(), Expr::Field(FieldPath::child(&docs, column)));
        }
    }

    for op in serializations {
        for column in &op.columns {
            add_fields.insert(
                column.clone(),
                Expr::Field(FieldPath::child(&op.new_column_name, column)),
            );
        }
        project.insert(op.new_column_name.clone(), Projection::Exclude);
    }

    if !add_fields.is_empty() {
        pipeline.push(Stage::AddFields(add_fields));
    }
    pipeline.push(Stage::Project(project));
    pipeline
}
