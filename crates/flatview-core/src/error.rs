//! Error types for migration runs.

use flatview_ingest::IngestError;
use flatview_model::{ConfigError, TableError};
use flatview_store::StoreError;
use flatview_transform::TransformError;
use flatview_verify::VerifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    // === Precondition Errors ===
    #[error("database '{database}' already exists")]
    DatabaseExists { database: String },

    #[error("database '{database}' does not exist")]
    DatabaseNotFound { database: String },

    #[error("view '{view}' already exists in database '{database}' (overwrite not requested)")]
    ViewExists { database: String, view: String },

    // === Stage Errors ===
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

pub type Result<T> = std::result::Result<T, MigrationError>;
