//! Store-side migration steps and the end-to-end run.

use std::fmt;
use std::time::Instant;

use flatview_ingest::{load_table, standardise_column_names};
use flatview_model::{MigrationConfig, Operation, RoleConfig, Table};
use flatview_pipeline::build_flattening_pipeline;
use flatview_store::{ADMIN_DATABASE, Command, DocumentStore, database_exists, view_exists};
use flatview_verify::{IntegrityReport, verify};
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::error::{MigrationError, Result};
use crate::prepare::{Collection, coerce_source, prepare};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertedCollection {
    pub name: String,
    pub count: usize,
}

/// What [`install_flatten_view`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewAction {
    Created,
    Edited,
}

impl ViewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewAction::Created => "created",
            ViewAction::Edited => "edited",
        }
    }
}

impl fmt::Display for ViewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub database: String,
    pub collections: Vec<InsertedCollection>,
    pub view: String,
    pub view_action: ViewAction,
    pub roles: Vec<String>,
}

/// Read the configured source file and standardise its headers.
pub fn load_source(config: &MigrationConfig) -> Result<Table> {
    let raw = load_table(&config.source)?;
    Ok(standardise_column_names(raw)?)
}

/// Insert every collection into a database that must not exist yet.
pub fn insert_collections(
    store: &mut dyn DocumentStore,
    database: &str,
    collections: Vec<Collection>,
) -> Result<Vec<InsertedCollection>> {
    if database_exists(store, database)? {
        return Err(MigrationError::DatabaseExists {
            database: database.to_string(),
        });
    }

    let mut inserted = Vec::with_capacity(collections.len());
    for Collection { name, documents } in collections {
        if documents.is_empty() {
            warn!(database, collection = %name, "Collection has no documents");
            store.create_collection(database, &name)?;
            inserted.push(InsertedCollection { name, count: 0 });
            continue;
        }
        let ids = store.insert_many(database, &name, documents)?;
        info!(database, collection = %name, inserted = ids.len(), "Inserted collection");
        inserted.push(InsertedCollection {
            name,
            count: ids.len(),
        });
    }
    Ok(inserted)
}

/// Create or redefine the flatten view over `view_on`.
///
/// | database | view    | overwrite | result            |
/// |----------|---------|-----------|-------------------|
/// | missing  | -       | -         | `DatabaseNotFound`|
/// | present  | missing | -         | `create`          |
/// | present  | present | true      | `collMod`         |
/// | present  | present | false     | `ViewExists`      |
pub fn install_flatten_view(
    store: &mut dyn DocumentStore,
    database: &str,
    view: &str,
    view_on: &str,
    operations: &[Operation],
    overwrite: bool,
) -> Result<ViewAction> {
    if !database_exists(store, database)? {
        return Err(MigrationError::DatabaseNotFound {
            database: database.to_string(),
        });
    }

    let pipeline = build_flattening_pipeline(operations);
    let (command, action) = if view_exists(store, database, view)? {
        if !overwrite {
            return Err(MigrationError::ViewExists {
                database: database.to_string(),
                view: view.to_string(),
            });
        }
        let command = Command::CollMod {
            name: view.to_string(),
            view_on: view_on.to_string(),
            pipeline,
        };
        (command, ViewAction::Edited)
    } else {
        let command = Command::Create {
            name: view.to_string(),
            view_on: view_on.to_string(),
            pipeline,
        };
        (command, ViewAction::Created)
    };

    store
        .run_command(database, &command)?
        .check(command.name())?;
    info!(database, view, view_on, action = %action, "Installed flatten view");
    Ok(action)
}

/// Create each role on the admin database.
pub fn create_roles(store: &mut dyn DocumentStore, roles: &[RoleConfig]) -> Result<Vec<String>> {
    let mut created = Vec::with_capacity(roles.len());
    for role in roles {
        let command = Command::CreateRole(role.clone());
        store
            .run_command(ADMIN_DATABASE, &command)?
            .check(command.name())?;
        info!(role = %role.role, privileges = role.privileges.len(), "Created role");
        created.push(role.role.clone());
    }
    Ok(created)
}

/// Validate, prepare, insert, install the view and create roles.
pub fn run_migration(
    store: &mut dyn DocumentStore,
    table: &Table,
    config: &MigrationConfig,
) -> Result<MigrationSummary> {
    let span = info_span!("migrate", database = %config.store.database);
    let _guard = span.enter();
    let start = Instant::now();

    config.validate()?;
    let prepared = prepare(table, config)?;
    let database = &config.store.database;
    let collections = insert_collections(store, database, prepared.collections)?;
    let view_action = install_flatten_view(
        store,
        database,
        &config.store.view,
        &config.store.main_collection,
        &config.operations(),
        config.overwrite_view,
    )?;
    let roles = create_roles(store, &config.roles)?;

    info!(
        collections = collections.len(),
        roles = roles.len(),
        duration_ms = start.elapsed().as_millis(),
        "Migration complete"
    );
    Ok(MigrationSummary {
        database: database.clone(),
        collections,
        view: config.store.view.clone(),
        view_action,
        roles,
    })
}

/// Check the flatten view against the coerced `table`.
pub fn run_verification(
    store: &dyn DocumentStore,
    table: &Table,
    config: &MigrationConfig,
) -> Result<IntegrityReport> {
    let span = info_span!("verify", database = %config.store.database, view = %config.store.view);
    let _guard = span.enter();
    let start = Instant::now();

    config.validate()?;
    let typed = coerce_source(table, config)?;
    let report = verify(
        store,
        &config.store.database,
        &config.store.view,
        &typed,
        &config.type_matchup(),
    )?;

    info!(
        clean = report.is_clean(),
        duration_ms = start.elapsed().as_millis(),
        "Verification complete"
    );
    Ok(report)
}
