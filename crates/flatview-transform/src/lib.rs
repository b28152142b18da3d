//! Table transformations applied before storage.
//!
//! - [`coerce`]: cast every column to its declared [`ColumnType`](flatview_model::ColumnType)
//! - [`normalize`]: move distinct value tuples into a reference table keyed by `_id`
//! - [`serialize`]: collapse columns into one nested-object column
//!
//! All three are pure functions from tables to tables.

pub mod coerce;
pub mod datetime;
pub mod error;
pub mod normalize;
pub mod serialize;

pub use coerce::{Converter, coerce, converter};
pub use datetime::parse_datetime;
pub use error::{Result, TransformError};
pub use normalize::{Normalized, normalize};
pub use serialize::serialize;
