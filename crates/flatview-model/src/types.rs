//! Type tags used across a migration.
//!
//! Three vocabularies meet here:
//!
//! - [`ColumnType`]: the coercion target declared per column in the config
//! - [`ValueKind`]: the runtime kind of a coerced value
//! - [`StoreType`]: the `$type` label the document store reports for a field
//!
//! [`TypeMatchup`] maps storage labels onto runtime kinds so the type
//! integrity check can compare both sides.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Coercion target of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Int,
    Float,
    #[serde(rename = "datetime")]
    DateTime,
    /// Left as-is.
    Object,
}

impl ColumnType {
    pub const ALL: [ColumnType; 5] = [
        ColumnType::String,
        ColumnType::Int,
        ColumnType::Float,
        ColumnType::DateTime,
        ColumnType::Object,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::DateTime => "datetime",
            ColumnType::Object => "object",
        }
    }

    /// Resolve a config tag. Tags are matched exactly.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unknown column type '{s}'"))
    }
}

/// Runtime kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    String,
    Int,
    Float,
    #[serde(rename = "datetime")]
    DateTime,
    Array,
    Object,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::DateTime => "datetime",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage type label as reported by the `$type` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    Double,
    String,
    Object,
    Array,
    Bool,
    Date,
    Null,
    Int,
    Long,
    Missing,
}

impl StoreType {
    pub const ALL: [StoreType; 10] = [
        StoreType::Double,
        StoreType::String,
        StoreType::Object,
        StoreType::Array,
        StoreType::Bool,
        StoreType::Date,
        StoreType::Null,
        StoreType::Int,
        StoreType::Long,
        StoreType::Missing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Double => "double",
            StoreType::String => "string",
            StoreType::Object => "object",
            StoreType::Array => "array",
            StoreType::Bool => "bool",
            StoreType::Date => "date",
            StoreType::Null => "null",
            StoreType::Int => "int",
            StoreType::Long => "long",
            StoreType::Missing => "missing",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }

    /// Label the store reports for a present value.
    ///
    /// Integers are `int` when they fit in 32 bits and `long` otherwise.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => StoreType::Null,
            Value::String(_) => StoreType::String,
            Value::Int(v) if i32::try_from(*v).is_ok() => StoreType::Int,
            Value::Int(_) => StoreType::Long,
            Value::Float(_) => StoreType::Double,
            Value::DateTime(_) => StoreType::Date,
            Value::Array(_) => StoreType::Array,
            Value::Object(_) => StoreType::Object,
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed lookup from storage type labels to runtime value kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeMatchup {
    entries: BTreeMap<StoreType, ValueKind>,
}

impl Default for TypeMatchup {
    fn default() -> Self {
        let entries = [
            (StoreType::String, ValueKind::String),
            (StoreType::Int, ValueKind::Int),
            (StoreType::Long, ValueKind::Int),
            (StoreType::Double, ValueKind::Float),
            (StoreType::Date, ValueKind::DateTime),
            (StoreType::Null, ValueKind::Null),
            (StoreType::Object, ValueKind::Object),
            (StoreType::Array, ValueKind::Array),
        ]
        .into_iter()
        .collect();
        Self { entries }
    }
}

impl TypeMatchup {
    #[must_use]
    pub fn lookup(&self, store_type: StoreType) -> Option<ValueKind> {
        self.entries.get(&store_type).copied()
    }

    /// Defaults with the given entries replacing or extending them.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<StoreType, ValueKind>) -> Self {
        let mut matchup = Self::default();
        for (store_type, kind) in overrides {
            matchup.entries.insert(*store_type, *kind);
        }
        matchup
    }

    pub fn iter(&self) -> impl Iterator<Item = (StoreType, ValueKind)> + '_ {
        self.entries.iter().map(|(s, k)| (*s, *k))
    }
}
