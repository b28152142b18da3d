//! In-memory document store.
//!
//! Implements [`DocumentStore`] over plain maps, optionally persisted to a
//! JSON snapshot after every write. Views are stored as definitions and
//! evaluated on read, so a redefined view is visible immediately.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use flatview_model::{Document, IDENTITY_FIELD, RoleConfig, Value};
use flatview_pipeline::Pipeline;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{CollectionFilter, CollectionInfo, CollectionKind, DocumentStore};
use crate::command::{Command, CommandResult};
use crate::engine::{CollectionSource, run_pipeline};
use crate::error::{Result, StoreError};

/// Views may be defined over views up to this depth.
pub const MAX_VIEW_DEPTH: usize = 20;

/// Database administrative commands run against.
pub const ADMIN_DATABASE: &str = "admin";

// Server error codes used in failure replies.
const NAMESPACE_NOT_FOUND: i32 = 26;
const NAMESPACE_EXISTS: i32 = 48;
const INVALID_OPTIONS: i32 = 72;
const ROLE_EXISTS: i32 = 51002;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ViewDef {
    view_on: String,
    pipeline: Pipeline,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Database {
    #[serde(default)]
    collections: BTreeMap<String, Vec<Document>>,
    #[serde(default)]
    views: BTreeMap<String, ViewDef>,
    #[serde(default)]
    roles: BTreeMap<String, RoleConfig>,
}

impl Database {
    fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.views.is_empty() && self.roles.is_empty()
    }

    fn has_namespace(&self, name: &str) -> bool {
        self.collections.contains_key(name) || self.views.contains_key(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    databases: BTreeMap<String, Database>,
    next_id: u64,
}

/// Document store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Snapshot,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by a snapshot file, creating it on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&text).map_err(|source| StoreError::Snapshot {
                path: path.clone(),
                source,
            })?
        } else {
            Snapshot::default()
        };
        debug!(path = %path.display(), databases = state.databases.len(), "Opened store snapshot");
        Ok(Self {
            state,
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the snapshot, if file backed.
    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(&self.state).map_err(|source| StoreError::Snapshot {
            path: path.clone(),
            source,
        })?;
        // Write then rename so a failed write never truncates the snapshot.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    fn next_object_id(&mut self) -> Value {
        let id = self.state.next_id;
        self.state.next_id += 1;
        Value::String(format!("{id:024x}"))
    }

    fn resolve(&self, database: &str, name: &str, depth: usize) -> Result<Vec<Document>> {
        let Some(db) = self.state.databases.get(database) else {
            return Ok(Vec::new());
        };
        if let Some(docs) = db.collections.get(name) {
            return Ok(docs.clone());
        }
        let Some(view) = db.views.get(name) else {
            return Ok(Vec::new());
        };
        if depth >= MAX_VIEW_DEPTH {
            return Err(StoreError::ViewDepthExceeded {
                namespace: namespace(database, name),
                max_depth: MAX_VIEW_DEPTH,
            });
        }
        let base = self.resolve(database, &view.view_on, depth + 1)?;
        let source = Source {
            store: self,
            database,
            depth: depth + 1,
        };
        run_pipeline(base, &view.pipeline, &source)
    }

    fn create_view(&mut self, database: &str, name: &str, view_on: &str, pipeline: &Pipeline) -> CommandResult {
        let db = self.state.databases.entry(database.to_string()).or_default();
        if db.has_namespace(name) {
            return CommandResult::error(
                NAMESPACE_EXISTS,
                "NamespaceExists",
                format!("namespace {} already exists", namespace(database, name)),
            );
        }
        db.views.insert(
            name.to_string(),
            ViewDef {
                view_on: view_on.to_string(),
                pipeline: pipeline.clone(),
            },
        );
        CommandResult::ok()
    }

    fn modify_view(&mut self, database: &str, name: &str, view_on: &str, pipeline: &Pipeline) -> CommandResult {
        let db = self.state.databases.get_mut(database);
        let Some(db) = db.filter(|db| db.has_namespace(name)) else {
            return CommandResult::error(
                NAMESPACE_NOT_FOUND,
                "NamespaceNotFound",
                format!("ns does not exist: {}", namespace(database, name)),
            );
        };
        let Some(view) = db.views.get_mut(name) else {
            return CommandResult::error(
                INVALID_OPTIONS,
                "InvalidOptions",
                "option viewOn is only supported on views",
            );
        };
        view.view_on = view_on.to_string();
        view.pipeline = pipeline.clone();
        CommandResult::ok()
    }

    fn create_role(&mut self, database: &str, role: &RoleConfig) -> CommandResult {
        let db = self.state.databases.entry(database.to_string()).or_default();
        if db.roles.contains_key(&role.role) {
            return CommandResult::error(
                ROLE_EXISTS,
                "Location51002",
                format!("Role \"{}@{database}\" already exists", role.role),
            );
        }
        db.roles.insert(role.role.clone(), role.clone());
        CommandResult::ok()
    }

    /// Roles defined in a database.
    pub fn roles(&self, database: &str) -> Vec<&RoleConfig> {
        self.state
            .databases
            .get(database)
            .map(|db| db.roles.values().collect())
            .unwrap_or_default()
    }
}

struct Source<'a> {
    store: &'a MemoryStore,
    database: &'a str,
    depth: usize,
}

impl CollectionSource for Source<'_> {
    fn read(&self, name: &str) -> Result<Vec<Document>> {
        self.store.resolve(self.database, name, self.depth)
    }
}

fn namespace(database: &str, name: &str) -> String {
    format!("{database}.{name}")
}

impl DocumentStore for MemoryStore {
    fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self
            .state
            .databases
            .iter()
            .filter(|(_, db)| !db.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn list_collections(&self, database: &str, filter: CollectionFilter) -> Result<Vec<CollectionInfo>> {
        let Some(db) = self.state.databases.get(database) else {
            return Ok(Vec::new());
        };
        let collections = db.collections.keys().map(|name| CollectionInfo {
            name: name.clone(),
            kind: CollectionKind::Collection,
        });
        let views = db.views.keys().map(|name| CollectionInfo {
            name: name.clone(),
            kind: CollectionKind::View,
        });
        let mut infos: Vec<CollectionInfo> = collections
            .chain(views)
            .filter(|info| filter.matches(info.kind))
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    fn create_collection(&mut self, database: &str, name: &str) -> Result<()> {
        let db = self.state.databases.entry(database.to_string()).or_default();
        if db.views.contains_key(name) {
            return Err(StoreError::NotACollection {
                namespace: namespace(database, name),
            });
        }
        db.collections.entry(name.to_string()).or_default();
        self.flush()
    }

    fn insert_many(&mut self, database: &str, collection: &str, documents: Vec<Document>) -> Result<Vec<Value>> {
        let ns = namespace(database, collection);
        if self
            .state
            .databases
            .get(database)
            .is_some_and(|db| db.views.contains_key(collection))
        {
            return Err(StoreError::NotACollection { namespace: ns });
        }

        let mut documents = documents;
        for doc in &mut documents {
            if !doc.contains_key(IDENTITY_FIELD) {
                let id = self.next_object_id();
                doc.insert(IDENTITY_FIELD, id);
            }
        }

        let existing = self
            .state
            .databases
            .get(database)
            .and_then(|db| db.collections.get(collection));
        let mut seen: BTreeSet<Value> = existing
            .into_iter()
            .flatten()
            .filter_map(|doc| doc.get(IDENTITY_FIELD).cloned())
            .collect();
        let mut ids = Vec::with_capacity(documents.len());
        for doc in &documents {
            let id = doc.get(IDENTITY_FIELD).cloned().unwrap_or(Value::Null);
            if !seen.insert(id.clone()) {
                return Err(StoreError::DuplicateKey {
                    namespace: ns,
                    id: id.to_string(),
                });
            }
            ids.push(id);
        }

        let count = documents.len();
        self.state
            .databases
            .entry(database.to_string())
            .or_default()
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        info!(namespace = %ns, count, "Inserted documents");
        self.flush()?;
        Ok(ids)
    }

    fn aggregate(&self, database: &str, collection: &str, pipeline: &Pipeline) -> Result<Vec<Document>> {
        let base = self.resolve(database, collection, 0)?;
        let source = Source {
            store: self,
            database,
            depth: 0,
        };
        run_pipeline(base, pipeline, &source)
    }

    fn run_command(&mut self, database: &str, command: &Command) -> Result<CommandResult> {
        debug!(database, command = command.name(), "Running command");
        let result = match command {
            Command::Create {
                name,
                view_on,
                pipeline,
            } => self.create_view(database, name, view_on, pipeline),
            Command::CollMod {
                name,
                view_on,
                pipeline,
            } => self.modify_view(database, name, view_on, pipeline),
            Command::CreateRole(role) => self.create_role(database, role),
        };
        if result.is_ok() {
            self.flush()?;
        }
        Ok(result)
    }
}
