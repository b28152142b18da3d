//! Document store access for flatview.
//!
//! [`DocumentStore`] is the client surface the migration and the verifier
//! use. [`MemoryStore`] implements it with a local aggregation engine so a
//! migration can run and be verified without a server.

pub mod client;
pub mod command;
pub mod engine;
pub mod error;
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

pub use client::{
    CollectionFilter, CollectionInfo, CollectionKind, DocumentStore, database_exists, view_exists,
};
pub use command::{Command, CommandResult};
pub use engine::{CollectionSource, compare_values, eval, run_pipeline};
pub use error::{Result, StoreError};
pub use memory::{ADMIN_DATABASE, MAX_VIEW_DEPTH, MemoryStore};
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;

/// Open a store from a URI.
///
/// - `memory://` for a fresh in-memory store
/// - `file://<path>` for an in-memory store persisted to a JSON snapshot
/// - `mongodb://` or `mongodb+srv://` for a server, with the `mongodb` feature
pub fn connect(uri: &str) -> Result<Box<dyn DocumentStore>> {
    if uri == "memory://" {
        return Ok(Box::new(MemoryStore::new()));
    }
    if let Some(path) = uri.strip_prefix("file://") {
        if path.is_empty() {
            return Err(StoreError::UnsupportedUri {
                uri: uri.to_string(),
                reason: "missing snapshot path".to_string(),
            });
        }
        return Ok(Box::new(MemoryStore::open(path)?));
    }
    if uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://") {
        return connect_mongodb(uri);
    }
    Err(StoreError::UnsupportedUri {
        uri: uri.to_string(),
        reason: "expected memory://, file://<path> or mongodb://".to_string(),
    })
}

#[cfg(feature = "mongodb")]
fn connect_mongodb(uri: &str) -> Result<Box<dyn DocumentStore>> {
    Ok(Box::new(MongoStore::connect(uri)?))
}

#[cfg(not(feature = "mongodb"))]
fn connect_mongodb(uri: &str) -> Result<Box<dyn DocumentStore>> {
    Err(StoreError::UnsupportedUri {
        uri: uri.to_string(),
        reason: "built without the mongodb feature".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_schemes() {
        assert!(connect("memory://").is_ok());
        assert!(matches!(connect("file://"), Err(StoreError::UnsupportedUri { .. })));
        assert!(matches!(
            connect("redis://localhost:6379"),
            Err(StoreError::UnsupportedUri { .. })
        ));
    }

    #[cfg(not(feature = "mongodb"))]
    #[test]
    fn test_mongodb_needs_feature() {
        match connect("mongodb://localhost:27017") {
            Err(StoreError::UnsupportedUri { reason, .. }) => assert!(reason.contains("mongodb feature")),
            other => panic!("expected UnsupportedUri, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(feature = "mongodb")]
    #[test]
    fn test_mongodb_client_is_lazy() {
        // No server is contacted until the first operation.
        assert!(connect("mongodb://localhost:27017").is_ok());
    }
}
