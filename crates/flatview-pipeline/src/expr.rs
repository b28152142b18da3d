//! Expressions, projections and the ordered maps stages are built from.

use std::fmt;

use serde_json::{Map, Value as Json};

use crate::error::{PipelineError, Result};

const ROOT: &str = "$$ROOT";

/// A dotted field path, written `$path` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// `base.field`
    pub fn child(base: &str, field: &str) -> Self {
        Self(format!("{base}.{field}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wire form with the leading `$`.
    pub fn to_reference(&self) -> String {
        format!("${}", self.0)
    }

    /// Parse `$path`; `None` for anything else, including `$$` variables.
    pub fn from_reference(raw: &str) -> Option<Self> {
        let path = raw.strip_prefix('$')?;
        if path.is_empty() || path.starts_with('$') {
            return None;
        }
        Some(Self(path.to_string()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insertion-ordered map. Re-inserting a key keeps its first position.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for FieldMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> FieldMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn to_json_with(&self, f: impl Fn(&T) -> Json) -> Json {
        Json::Object(self.entries.iter().map(|(k, v)| (k.clone(), f(v))).collect())
    }

    pub(crate) fn from_json_with(
        map: &Map<String, Json>,
        f: impl Fn(&Json) -> Result<T>,
    ) -> Result<Self> {
        let mut out = Self::new();
        for (key, value) in map {
            out.insert(key.clone(), f(value)?);
        }
        Ok(out)
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for FieldMap<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Aggregation expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `"$a.b"`
    Field(FieldPath),
    /// `"$$ROOT"`, the whole current document.
    Root,
    /// Integer literal.
    Int(i64),
    /// Object whose values are expressions.
    Object(FieldMap<Expr>),
    /// `{"$objectToArray": expr}`: `[{k, v}, ...]` in field order.
    ObjectToArray(Box<Expr>),
    /// `{"$type": expr}`: storage type label of the value.
    Type(Box<Expr>),
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field(FieldPath::new(path))
    }

    pub fn to_json(&self) -> Json {
        match self {
            Expr::Field(path) => Json::String(path.to_reference()),
            Expr::Root => Json::String(ROOT.to_string()),
            Expr::Int(v) => Json::from(*v),
            Expr::Object(fields) => fields.to_json_with(Expr::to_json),
            Expr::ObjectToArray(inner) => operator("$objectToArray", inner.to_json()),
            Expr::Type(inner) => operator("$type", inner.to_json()),
        }
    }

    pub fn from_json(json: &Json) -> Result<Self> {
        match json {
            Json::String(s) if s == ROOT => Ok(Expr::Root),
            Json::String(s) => FieldPath::from_reference(s)
                .map(Expr::Field)
                .ok_or_else(|| unsupported(json)),
            Json::Number(n) => n.as_i64().map(Expr::Int).ok_or_else(|| unsupported(json)),
            Json::Object(map) => {
                if let Some((key, inner)) = single_operator(map) {
                    return match key {
                        "$objectToArray" => Ok(Expr::ObjectToArray(Box::new(Expr::from_json(inner)?))),
                        "$type" => Ok(Expr::Type(Box::new(Expr::from_json(inner)?))),
                        _ => Err(unsupported(json)),
                    };
                }
                FieldMap::from_json_with(map, Expr::from_json).map(Expr::Object)
            }
            _ => Err(unsupported(json)),
        }
    }
}

/// A `$project` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `0`
    Exclude,
    /// `1`
    Include,
    Expr(Expr),
}

impl Projection {
    pub fn to_json(&self) -> Json {
        match self {
            Projection::Exclude => Json::from(0),
            Projection::Include => Json::from(1),
            Projection::Expr(expr) => expr.to_json(),
        }
    }

    pub fn from_json(json: &Json) -> Result<Self> {
        match json {
            Json::Bool(false) => Ok(Projection::Exclude),
            Json::Bool(true) => Ok(Projection::Include),
            Json::Number(n) if n.as_f64() == Some(0.0) => Ok(Projection::Exclude),
            Json::Number(_) => Ok(Projection::Include),
            other => Expr::from_json(other).map(Projection::Expr),
        }
    }
}

/// `$group` accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum(Expr),
    Push(Expr),
}

impl Accumulator {
    pub fn to_json(&self) -> Json {
        match self {
            Accumulator::Sum(expr) => operator("$sum", expr.to_json()),
            Accumulator::Push(expr) => operator("$push", expr.to_json()),
        }
    }

    pub fn from_json(json: &Json) -> Result<Self> {
        let Some((key, inner)) = json.as_object().and_then(single_operator) else {
            return Err(unsupported(json));
        };
        match key {
            "$sum" => Ok(Accumulator::Sum(Expr::from_json(inner)?)),
            "$push" => Ok(Accumulator::Push(Expr::from_json(inner)?)),
            _ => Err(unsupported(json)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn to_json(self) -> Json {
        match self {
            SortOrder::Ascending => Json::from(1),
            SortOrder::Descending => Json::from(-1),
        }
    }

    pub fn from_json(json: &Json) -> Result<Self> {
        match json.as_i64() {
            Some(1) => Ok(SortOrder::Ascending),
            Some(-1) => Ok(SortOrder::Descending),
            _ => Err(unsupported(json)),
        }
    }
}

pub(crate) fn operator(name: &str, arg: Json) -> Json {
    let mut map = Map::new();
    map.insert(name.to_string(), arg);
    Json::Object(map)
}

fn single_operator(map: &Map<String, Json>) -> Option<(&str, &Json)> {
    if map.len() != 1 {
        return None;
    }
    let (key, value) = map.iter().next()?;
    key.starts_with('$').then_some((key.as_str(), value))
}

fn unsupported(json: &Json) -> PipelineError {
    PipelineError::UnsupportedExpression {
        expr: json.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_path_references() {
        assert_eq!(FieldPath::child("hospitalsDocs", "hospital").to_reference(), "$hospitalsDocs.hospital");
        assert_eq!(FieldPath::from_reference("$kv.k"), Some(FieldPath::new("kv.k")));
        assert_eq!(FieldPath::from_reference("$$ROOT"), None);
        assert_eq!(FieldPath::from_reference("plain"), None);
    }

    #[test]
    fn test_field_map_keeps_first_position() {
        let mut map = FieldMap::new();
        map.insert("_id", Projection::Exclude);
        map.insert("patient", Projection::Exclude);
        map.insert("_id", Projection::Include);
        assert_eq!(map.keys().collect::<Vec<_>>(), ["_id", "patient"]);
        assert_eq!(map.get("_id"), Some(&Projection::Include));
    }

    #[test]
    fn test_expr_json() {
        let expr = Expr::Object(
            [
                ("field", Expr::field("kv.k")),
                ("type", Expr::Type(Box::new(Expr::field("kv.v")))),
            ]
            .into_iter()
            .collect(),
        );
        let json = expr.to_json();
        assert_eq!(json, json!({"field": "$kv.k", "type": {"$type": "$kv.v"}}));
        assert_eq!(Expr::from_json(&json).unwrap(), expr);
    }

    #[test]
    fn test_unsupported_operator() {
        let err = Expr::from_json(&json!({"$concat": ["$a", "$b"]})).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedExpression { .. }));
        assert!(Expr::from_json(&json!("literal")).is_err());
    }

    #[test]
    fn test_projection_flags() {
        assert_eq!(Projection::from_json(&json!(0)).unwrap(), Projection::Exclude);
        assert_eq!(Projection::from_json(&json!(false)).unwrap(), Projection::Exclude);
        assert_eq!(Projection::from_json(&json!(1)).unwrap(), Projection::Include);
        assert_eq!(
            Projection::from_json(&json!({"$objectToArray": "$$ROOT"})).unwrap(),
            Projection::Expr(Expr::ObjectToArray(Box::new(Expr::Root)))
        );
    }
}
