//! Aggregation pipelines for flatview.
//!
//! A small typed model of the stages and expressions the migration emits,
//! with a lossless mapping to the document store's JSON wire form, and the
//! two pipelines the migration needs:
//!
//! - [`build_flattening_pipeline`]: the read path installed as the flatten view
//! - [`type_count_pipeline`]: per-field type counts used by the verifier

pub mod error;
pub mod expr;
pub mod flatten;
pub mod stage;
pub mod typecount;

pub use error::{PipelineError, Result};
pub use expr::{Accumulator, Expr, FieldMap, FieldPath, Projection, SortOrder};
pub use flatten::{LOOKUP_SUFFIX, build_flattening_pipeline, build_pipeline};
pub use stage::{Group, Lookup, Pipeline, Stage};
pub use typecount::type_count_pipeline;
