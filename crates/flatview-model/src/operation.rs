//! Normalization and serialization operations.
//!
//! Operations are declarative: the transform crate applies them to a table
//! and the pipeline crate replays the same list to build the read path.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Suffix of the temporary array a flatten view's lookup writes into.
pub const LOOKUP_SUFFIX: &str = "Docs";

/// Extract the distinct values of `columns` into a reference collection and
/// replace them with a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOp {
    #[serde(alias = "names", deserialize_with = "one_or_many")]
    pub columns: Vec<String>,
    /// Foreign-key column written into the reduced table.
    pub new_column_name: String,
    /// Collection holding the reference rows.
    pub new_table_name: String,
}

/// Collapse `columns` into one nested-object column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializeOp {
    #[serde(alias = "names", deserialize_with = "one_or_many")]
    pub columns: Vec<String>,
    pub new_column_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Normalize(NormalizeOp),
    Serialize(SerializeOp),
}

impl NormalizeOp {
    pub fn new<I, S>(columns: I, new_column_name: impl Into<String>, new_table_name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            new_column_name: new_column_name.into(),
            new_table_name: new_table_name.into(),
        }
    }

    /// Temporary field the flatten view joins the reference rows into.
    pub fn lookup_field(&self) -> String {
        format!("{}{LOOKUP_SUFFIX}", self.new_table_name)
    }
}

impl SerializeOp {
    pub fn new<I, S>(columns: I, new_column_name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            new_column_name: new_column_name.into(),
        }
    }
}

impl Operation {
    /// Source columns consumed by the operation.
    pub fn columns(&self) -> &[String] {
        match self {
            Operation::Normalize(op) => &op.columns,
            Operation::Serialize(op) => &op.columns,
        }
    }

    /// Column the operation writes in place of its sources.
    pub fn new_column_name(&self) -> &str {
        match self {
            Operation::Normalize(op) => &op.new_column_name,
            Operation::Serialize(op) => &op.new_column_name,
        }
    }
}

impl From<NormalizeOp> for Operation {
    fn from(op: NormalizeOp) -> Self {
        Operation::Normalize(op)
    }
}

impl From<SerializeOp> for Operation {
    fn from(op: SerializeOp) -> Self {
        Operation::Serialize(op)
    }
}

impl fmt::Display for NormalizeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "normalize({} -> {} in {})",
            self.columns.join(", "),
            self.new_column_name,
            self.new_table_name
        )
    }
}

impl fmt::Display for SerializeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "serialize({} -> {})",
            self.columns.join(", "),
            self.new_column_name
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Normalize(op) => op.fmt(f),
            Operation::Serialize(op) => op.fmt(f),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(column) => vec![column],
        OneOrMany::Many(columns) => columns,
    })
}
