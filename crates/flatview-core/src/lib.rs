//! Migration orchestration for flatview.
//!
//! Ties the crates together in the order a run needs them:
//!
//! 1. **load**: read and standardise the source table ([`load_source`])
//! 2. **prepare**: coerce, normalize, assign identities, serialize ([`prepare`])
//! 3. **insert**: write reference and main collections ([`insert_collections`])
//! 4. **view**: install the flattening pipeline as a view ([`install_flatten_view`])
//! 5. **roles**: provision configured roles ([`create_roles`])
//!
//! [`run_verification`] then reads the view back and compares it with the
//! coerced source.

pub mod error;
pub mod migrate;
pub mod prepare;

pub use error::{MigrationError, Result};
pub use migrate::{
    InsertedCollection, MigrationSummary, ViewAction, create_roles, insert_collections,
    install_flatten_view, load_source, run_migration, run_verification,
};
pub use prepare::{Collection, PreparedMigration, coerce_source, prepare, with_positional_ids};
