//! Migration configuration.
//!
//! One [`MigrationConfig`] is loaded from TOML per run and passed by
//! reference to every stage. Nothing reads configuration from global state.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::IDENTITY_FIELD;
use crate::error::ConfigError;
use crate::operation::{NormalizeOp, Operation, SerializeOp};
use crate::types::{ColumnType, StoreType, TypeMatchup, ValueKind};

// =============================================================================
// ROOT CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Source CSV. Relative paths resolve against the config file's directory.
    pub source: PathBuf,

    pub store: StoreConfig,

    /// Replace an existing flatten view instead of failing.
    #[serde(default)]
    pub overwrite_view: bool,

    /// Coercion tag per column, as written in the file.
    pub columns: BTreeMap<String, String>,

    #[serde(default)]
    pub normalize: Vec<NormalizeOp>,

    #[serde(default)]
    pub serialize: Vec<SerializeOp>,

    /// Entries replacing or extending the default storage type lookup.
    #[serde(default)]
    pub type_matchup: BTreeMap<StoreType, ValueKind>,

    #[serde(default)]
    pub roles: Vec<RoleConfig>,
}

/// Where the migrated collections live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    pub database: String,
    pub main_collection: String,
    pub view: String,
}

fn default_uri() -> String {
    "memory://".to_string()
}

/// URI scheme of a store persisted to a local snapshot file.
pub const FILE_SCHEME: &str = "file://";

impl StoreConfig {
    /// Anchor a relative `file://` snapshot path at `dir`.
    pub fn resolve_snapshot_path(&mut self, dir: &Path) {
        let Some(path) = self.uri.strip_prefix(FILE_SCHEME) else {
            return;
        };
        if path.is_empty() || Path::new(path).is_absolute() {
            return;
        }
        self.uri = format!("{FILE_SCHEME}{}", dir.join(path).display());
    }
}

impl MigrationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file. Does not validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if config.source.is_relative()
            && let Some(dir) = path.parent()
        {
            config.source = dir.join(&config.source);
        }
        if let Some(dir) = path.parent() {
            config.store.resolve_snapshot_path(dir);
        }
        Ok(config)
    }

    /// Resolve the `[columns]` tags into coercion targets.
    pub fn coercion_spec(&self) -> Result<CoercionSpec, ConfigError> {
        CoercionSpec::from_tags(&self.columns)
    }

    /// Normalizations in file order, then serializations in file order.
    pub fn operations(&self) -> Vec<Operation> {
        self.normalize
            .iter()
            .cloned()
            .map(Operation::Normalize)
            .chain(self.serialize.iter().cloned().map(Operation::Serialize))
            .collect()
    }

    pub fn type_matchup(&self) -> TypeMatchup {
        TypeMatchup::with_overrides(&self.type_matchup)
    }

    /// Check the configuration before any data or store is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_name("store.database", &self.store.database)?;
        require_name("store.main_collection", &self.store.main_collection)?;
        require_name("store.view", &self.store.view)?;

        self.coercion_spec()?;

        let foreign_keys: BTreeSet<&str> = self
            .normalize
            .iter()
            .map(|op| op.new_column_name.as_str())
            .collect();

        let mut consumed: BTreeSet<String> = BTreeSet::new();
        for op in self.operations() {
            let label = op.to_string();
            if op.columns().is_empty() {
                return Err(ConfigError::EmptyColumns { operation: label });
            }
            require_name("new_column_name", op.new_column_name())?;
            if let Operation::Normalize(normalize) = &op {
                require_name("new_table_name", &normalize.new_table_name)?;
            }
            for column in op.columns() {
                if matches!(op, Operation::Serialize(_)) && foreign_keys.contains(column.as_str()) {
                    return Err(ConfigError::SerializedForeignKey {
                        column: column.clone(),
                        operation: label,
                    });
                }
                if !self.columns.contains_key(column) {
                    return Err(ConfigError::UnknownOperationColumn {
                        column: column.clone(),
                        operation: label,
                    });
                }
                if !consumed.insert(column.clone()) {
                    return Err(ConfigError::DuplicateColumn {
                        column: column.clone(),
                        operation: label,
                    });
                }
            }
        }

        let mut collections = BTreeSet::new();
        let collection_names = [self.store.main_collection.as_str(), self.store.view.as_str()]
            .into_iter()
            .chain(self.normalize.iter().map(|op| op.new_table_name.as_str()));
        for name in collection_names {
            if !collections.insert(name) {
                return Err(ConfigError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }

        // Source columns, written columns and the view's temporary lookup
        // arrays share one document namespace alongside `_id`.
        let mut fields: BTreeSet<String> = BTreeSet::from([IDENTITY_FIELD.to_string()]);
        let field_names = self
            .columns
            .keys()
            .cloned()
            .chain(self.normalize.iter().map(|op| op.new_column_name.clone()))
            .chain(self.serialize.iter().map(|op| op.new_column_name.clone()))
            .chain(self.normalize.iter().map(NormalizeOp::lookup_field));
        for name in field_names {
            if !fields.insert(name.clone()) {
                return Err(ConfigError::DuplicateName { name });
            }
        }

        Ok(())
    }
}

fn require_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyName { field });
    }
    Ok(())
}

// =============================================================================
// COERCION SPEC
// =============================================================================

/// Resolved coercion target per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionSpec {
    targets: BTreeMap<String, ColumnType>,
}

impl CoercionSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>, ty: ColumnType) -> Self {
        self.targets.insert(column.into(), ty);
        self
    }

    pub fn from_tags(tags: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut spec = Self::new();
        for (column, tag) in tags {
            let ty = ColumnType::from_tag(tag).ok_or_else(|| ConfigError::UnknownColumnType {
                column: column.clone(),
                tag: tag.clone(),
            })?;
            spec.targets.insert(column.clone(), ty);
        }
        Ok(spec)
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<ColumnType> {
        self.targets.get(column).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.targets.iter().map(|(c, t)| (c.as_str(), *t))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// =============================================================================
// ROLES
// =============================================================================

/// A role created on the `admin` database after the migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub role: String,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
    /// Inherited roles.
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privilege {
    pub resource: Resource,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub db: String,
    pub collection: String,
}
