//! Error types for table transformations.

use flatview_model::{ColumnType, TableError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// Every table column needs a coercion target.
    #[error("column '{column}' has no entry in the coercion spec")]
    MissingColumnType { column: String },

    #[error("{operation}: column '{column}' not found in table")]
    MissingColumn { column: String, operation: String },

    #[error("{operation}: column '{column}' already exists in table")]
    ColumnExists { column: String, operation: String },

    /// A non-null value that cannot be represented in the target type.
    #[error("row {row}, column '{column}': cannot convert '{value}' to {target}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
        target: ColumnType,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

pub type Result<T> = std::result::Result<T, TransformError>;
