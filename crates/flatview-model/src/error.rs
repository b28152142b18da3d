use std::path::PathBuf;

use thiserror::Error;

/// Configuration problems detected before any data is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(
        "'{tag}' is not a recognised type for column '{column}' \
         (expected one of: string, int, float, datetime, object)"
    )]
    UnknownColumnType { column: String, tag: String },

    #[error("{operation} has no source columns")]
    EmptyColumns { operation: String },

    #[error("column '{column}' is listed more than once in {operation}")]
    DuplicateColumn { column: String, operation: String },

    #[error("column '{column}' used by {operation} has no entry in [columns]")]
    UnknownOperationColumn { column: String, operation: String },

    #[error("name '{name}' is used by more than one collection or column")]
    DuplicateName { name: String },

    #[error("{operation} serialises '{column}', the foreign key written by a normalization")]
    SerializedForeignKey { column: String, operation: String },

    #[error("{field} must not be empty")]
    EmptyName { field: &'static str },
}

/// Shape violations when building a [`crate::Table`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },

    #[error("row has {found} values but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },
}
