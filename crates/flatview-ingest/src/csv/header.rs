//! Header standardisation.

use flatview_model::Table;

use crate::error::{IngestError, Result};

/// Lower-case a header and replace spaces with underscores.
pub fn standardise_column_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Rename every column of `table` with [`standardise_column_name`].
///
/// Fails when two headers collapse onto the same name.
pub fn standardise_column_names(table: Table) -> Result<Table> {
    let (columns, rows) = table.into_parts();
    let mut renamed: Vec<String> = Vec::with_capacity(columns.len());
    for column in &columns {
        let name = standardise_column_name(column);
        if renamed.contains(&name) {
            return Err(IngestError::DuplicateColumn { column: name });
        }
        renamed.push(name);
    }
    Ok(Table::from_rows(renamed, rows)?)
}
