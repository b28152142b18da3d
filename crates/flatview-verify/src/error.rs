//! Error types for integrity verification.
//!
//! A mismatch is not an error: it is reported through
//! [`IntegrityReport`](crate::IntegrityReport). These variants cover checks
//! that could not run.

use flatview_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    // === Precondition Errors ===
    #[error("database '{database}' does not exist")]
    DatabaseNotFound { database: String },

    #[error("view '{view}' does not exist in database '{database}'")]
    ViewNotFound { database: String, view: String },

    // === Type Count Errors ===
    /// The store reported a type label the matchup has no entry for.
    #[error("field '{field}' has storage type '{label}' with no matching value kind")]
    UnmappedStoreType { field: String, label: String },

    #[error("malformed type count document: {reason}")]
    MalformedTypeCount { reason: String },

    // === Store Errors ===
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
