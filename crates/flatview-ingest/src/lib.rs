//! Source table ingestion for flatview.
//!
//! Reads a delimited file with polars and converts it into a
//! [`flatview_model::Table`], then standardises headers the way the
//! migration expects them (`Blood Type` becomes `blood_type`).
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use flatview_ingest::{load_table, standardise_column_names};
//!
//! let raw = load_table(Path::new("data/healthcare_sample.csv"))?;
//! let table = standardise_column_names(raw)?;
//! ```

mod csv;
mod error;
mod polars_utils;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{
    MAX_CSV_FILE_SIZE, check_file_size, check_file_size_with_limit, dataframe_to_table,
    load_table, standardise_column_name, standardise_column_names, validate_encoding,
};

// === Polars Conversion ===
pub use polars_utils::any_to_value;
