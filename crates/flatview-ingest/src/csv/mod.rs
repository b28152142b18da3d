//! CSV reading utilities.

mod header;
mod reader;

pub use header::{standardise_column_name, standardise_column_names};
pub use reader::{
    MAX_CSV_FILE_SIZE, check_file_size, check_file_size_with_limit, dataframe_to_table,
    load_table, validate_encoding,
};
