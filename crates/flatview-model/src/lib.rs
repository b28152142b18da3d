//! Data model for the flatview migration.
//!
//! This crate holds the types shared by every stage of a migration run:
//!
//! - **value** / **document**: cell values and ordered documents as they are
//!   stored in the document store
//! - **table**: the in-memory tabular shape the migration starts from
//! - **types**: coercion targets, runtime value kinds and storage type labels
//! - **operation**: normalization and serialization operations
//! - **config**: the explicit migration configuration loaded from TOML

pub mod config;
pub mod document;
pub mod error;
pub mod operation;
pub mod table;
pub mod types;
pub mod value;

pub use config::{
    CoercionSpec, FILE_SCHEME, MigrationConfig, Privilege, Resource, RoleConfig, StoreConfig,
};
pub use document::Document;
pub use error::{ConfigError, TableError};
pub use operation::{LOOKUP_SUFFIX, NormalizeOp, Operation, SerializeOp};
pub use table::Table;
pub use types::{ColumnType, StoreType, TypeMatchup, ValueKind};
pub use value::{DATETIME_FORMAT, Value};

/// Field holding the identity of every stored document.
pub const IDENTITY_FIELD: &str = "_id";
