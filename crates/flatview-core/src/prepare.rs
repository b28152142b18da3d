//! Table preparation: everything before the first store write.
//!
//! Order matters and matches the stored layout:
//!
//! 1. coerce every column to its declared type
//! 2. apply each normalization, collecting one reference table per operation
//! 3. give the reduced main table a positional `_id` as its first column
//! 4. apply each serialization
//!
//! References are returned before the main collection so they exist by the
//! time a lookup reads them.

use flatview_model::{Document, IDENTITY_FIELD, MigrationConfig, Table, Value};
use flatview_transform::{coerce, normalize, serialize};
use tracing::{debug, info};

use crate::error::Result;

/// A named collection ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: String,
    pub documents: Vec<Document>,
}

impl Collection {
    fn from_table(name: &str, table: &Table) -> Self {
        Self {
            name: name.to_string(),
            documents: table.to_documents(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMigration {
    /// The coerced source table: what the flatten view must read back as.
    pub typed: Table,
    /// Reference collections in operation order, then the main collection.
    pub collections: Vec<Collection>,
}

impl PreparedMigration {
    pub fn main_collection(&self) -> Option<&Collection> {
        self.collections.last()
    }
}

/// Prepend a `_id` column holding each row's index.
pub fn with_positional_ids(table: &Table) -> Result<Table> {
    let mut columns = Vec::with_capacity(table.width() + 1);
    columns.push(IDENTITY_FIELD.to_string());
    columns.extend(table.columns().iter().cloned());

    let rows = table
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut out = Vec::with_capacity(row.len() + 1);
            out.push(Value::Int(idx as i64));
            out.extend(row.iter().cloned());
            out
        })
        .collect();
    Ok(Table::from_rows(columns, rows)?)
}

/// Coerce the loaded table.
pub fn coerce_source(table: &Table, config: &MigrationConfig) -> Result<Table> {
    Ok(coerce(table, &config.coercion_spec()?)?)
}

/// Apply the configured operations to `table`. Pure; touches no store.
pub fn prepare(table: &Table, config: &MigrationConfig) -> Result<PreparedMigration> {
    let typed = coerce_source(table, config)?;

    let mut collections = Vec::with_capacity(config.normalize.len() + 1);
    let mut main = typed.clone();
    for op in &config.normalize {
        let normalized = normalize(&main, op)?;
        collections.push(Collection::from_table(&op.new_table_name, &normalized.reference));
        main = normalized.reduced;
    }

    main = with_positional_ids(&main)?;
    for op in &config.serialize {
        debug!(operation = %op, "Applying serialization");
        main = serialize(&main, op)?;
    }
    collections.push(Collection::from_table(&config.store.main_collection, &main));

    info!(
        rows = typed.height(),
        collections = collections.len(),
        main_columns = main.width(),
        "Prepared migration"
    );
    Ok(PreparedMigration { typed, collections })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_ids_first() {
        let table = Table::from_rows(
            vec!["a".to_string()],
            vec![vec![Value::from("x")], vec![Value::from("y")]],
        )
        .unwrap();
        let with_ids = with_positional_ids(&table).unwrap();
        assert_eq!(with_ids.columns(), ["_id", "a"]);
        assert_eq!(with_ids.get(1, "_id"), Some(&Value::Int(1)));
    }
}
