//! Error types for document store access.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// An administrative command replied with `ok != 1`.
    #[error("command '{command}' failed: {raw}")]
    CommandFailed {
        command: String,
        raw: serde_json::Value,
    },

    #[error("duplicate _id {id} in {namespace}")]
    DuplicateKey { namespace: String, id: String },

    #[error("namespace {namespace} is a view, not a collection")]
    NotACollection { namespace: String },

    #[error("view {namespace} nests more than {max_depth} views")]
    ViewDepthExceeded { namespace: String, max_depth: usize },

    #[error("unsupported store uri '{uri}': {reason}")]
    UnsupportedUri { uri: String, reason: String },

    #[error("aggregation failed in {stage}: {reason}")]
    Aggregation { stage: &'static str, reason: String },

    #[error("failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "mongodb")]
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("failed to encode bson: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("invalid store snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
