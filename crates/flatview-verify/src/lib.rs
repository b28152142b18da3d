//! Integrity verification of a flatten view.
//!
//! Checks that reading the flatten view gives back the table that was
//! migrated: the same value kinds per column ([`check_type_integrity`]) and
//! the same cells ignoring row and column order ([`check_value_integrity`]).
//! Mismatches are reported, never raised.

pub mod error;
pub mod report;
pub mod type_check;
pub mod value_check;

use flatview_model::{Table, TypeMatchup};
use flatview_store::{DocumentStore, database_exists, view_exists};

pub use error::{Result, VerifyError};
pub use report::{
    CellDifference, IntegrityReport, TypeDifference, TypeIntegrityReport, ValueIntegrityReport,
};
pub use type_check::{
    KindCounts, check_type_integrity, compare_kind_counts, store_kind_counts, table_kind_counts,
};
pub use value_check::{MAX_REPORTED_CELLS, check_value_integrity, compare_tables};

/// Fail unless `database` exists and holds a view named `view`.
pub fn ensure_view(store: &dyn DocumentStore, database: &str, view: &str) -> Result<()> {
    if !database_exists(store, database)? {
        return Err(VerifyError::DatabaseNotFound {
            database: database.to_string(),
        });
    }
    if !view_exists(store, database, view)? {
        return Err(VerifyError::ViewNotFound {
            database: database.to_string(),
            view: view.to_string(),
        });
    }
    Ok(())
}

/// Run both integrity checks.
pub fn verify(
    store: &dyn DocumentStore,
    database: &str,
    view: &str,
    expected: &Table,
    matchup: &TypeMatchup,
) -> Result<IntegrityReport> {
    Ok(IntegrityReport {
        type_report: check_type_integrity(store, database, view, expected, matchup)?,
        value_report: check_value_integrity(store, database, view, expected)?,
    })
}
