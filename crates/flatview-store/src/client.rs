//! The document store interface the migration talks to.

use flatview_model::{Document, Value};
use flatview_pipeline::Pipeline;

use crate::command::{Command, CommandResult};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Collection,
    View,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Collection => "collection",
            CollectionKind::View => "view",
        }
    }
}

/// Filter for [`DocumentStore::list_collections`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollectionFilter {
    #[default]
    All,
    Only(CollectionKind),
}

impl CollectionFilter {
    pub fn matches(self, kind: CollectionKind) -> bool {
        match self {
            CollectionFilter::All => true,
            CollectionFilter::Only(only) => only == kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub kind: CollectionKind,
}

/// Blocking document store client.
///
/// Administrative commands report failure through the reply, not the
/// `Result`: callers inspect it with [`CommandResult::check`].
pub trait DocumentStore {
    fn list_database_names(&self) -> Result<Vec<String>>;

    fn list_collections(&self, database: &str, filter: CollectionFilter) -> Result<Vec<CollectionInfo>>;

    /// Create an empty collection, creating the database if needed.
    fn create_collection(&mut self, database: &str, name: &str) -> Result<()>;

    /// Insert documents, returning their identities in input order.
    fn insert_many(&mut self, database: &str, collection: &str, documents: Vec<Document>) -> Result<Vec<Value>>;

    /// Run a pipeline over a collection or view.
    fn aggregate(&self, database: &str, collection: &str, pipeline: &Pipeline) -> Result<Vec<Document>>;

    /// Every document of a collection or view.
    fn find(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        self.aggregate(database, collection, &Pipeline::default())
    }

    fn run_command(&mut self, database: &str, command: &Command) -> Result<CommandResult>;
}

pub fn database_exists(store: &dyn DocumentStore, database: &str) -> Result<bool> {
    Ok(store
        .list_database_names()?
        .iter()
        .any(|name| name == database))
}

pub fn view_exists(store: &dyn DocumentStore, database: &str, view: &str) -> Result<bool> {
    Ok(store
        .list_collections(database, CollectionFilter::Only(CollectionKind::View))?
        .iter()
        .any(|info| info.name == view))
}
