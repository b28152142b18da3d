//! Aggregation engine.
//!
//! Evaluates a [`Pipeline`] over in-memory documents. Supports exactly the
//! stages and expressions in `flatview_pipeline`. A missing field is
//! distinct from an explicit `null` throughout, as it is on the server.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use flatview_model::{Document, StoreType, Value};
use flatview_pipeline::{Accumulator, Expr, FieldMap, Group, Lookup, Pipeline, Projection, SortOrder, Stage};

use crate::error::{Result, StoreError};

/// Resolves the `from` side of a `$lookup`.
pub trait CollectionSource {
    /// Documents of `name`; an unknown name reads as empty.
    fn read(&self, name: &str) -> Result<Vec<Document>>;
}

pub fn run_pipeline(
    mut documents: Vec<Document>,
    pipeline: &Pipeline,
    source: &dyn CollectionSource,
) -> Result<Vec<Document>> {
    for stage in pipeline.iter() {
        documents = match stage {
            Stage::Lookup(lookup) => run_lookup(documents, lookup, source)?,
            Stage::Unwind(path) => run_unwind(documents, path.as_str()),
            Stage::AddFields(fields) => documents
                .into_iter()
                .map(|doc| add_fields(doc, fields))
                .collect::<Result<_>>()?,
            Stage::Project(spec) => run_project(documents, spec)?,
            Stage::Group(group) => run_group(&documents, group)?,
            Stage::Sort(keys) => run_sort(documents, keys),
        };
    }
    Ok(documents)
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

/// Evaluate an expression; `None` is a missing value.
pub fn eval(expr: &Expr, doc: &Document) -> Result<Option<Value>> {
    Ok(match expr {
        Expr::Field(path) => doc.get_path(path.as_str()).cloned(),
        Expr::Root => Some(Value::Object(doc.clone())),
        Expr::Int(v) => Some(Value::Int(*v)),
        Expr::Object(fields) => {
            let mut out = Document::with_capacity(fields.len());
            for (name, inner) in fields.iter() {
                if let Some(value) = eval(inner, doc)? {
                    out.insert(name, value);
                }
            }
            Some(Value::Object(out))
        }
        Expr::ObjectToArray(inner) => match eval(inner, doc)? {
            None | Some(Value::Null) => Some(Value::Null),
            Some(Value::Object(obj)) => Some(Value::Array(
                obj.into_iter()
                    .map(|(k, v)| {
                        let mut pair = Document::with_capacity(2);
                        pair.insert("k", Value::String(k));
                        pair.insert("v", v);
                        Value::Object(pair)
                    })
                    .collect(),
            )),
            Some(other) => {
                return Err(StoreError::Aggregation {
                    stage: "$objectToArray",
                    reason: format!("expected a document, got {}", StoreType::of(&other)),
                });
            }
        },
        Expr::Type(inner) => {
            let label = eval(inner, doc)?.map_or(StoreType::Missing, |v| StoreType::of(&v));
            Some(Value::String(label.as_str().to_string()))
        }
    })
}

/// Server comparison: numbers compare by value across int and double.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Value::Float(a).cmp(&Value::Float(b)),
        _ => left.cmp(right),
    }
}

fn values_match(left: &Value, right: &Value) -> bool {
    compare_values(left, right) == Ordering::Equal
}

// =============================================================================
// STAGES
// =============================================================================

fn run_lookup(
    documents: Vec<Document>,
    lookup: &Lookup,
    source: &dyn CollectionSource,
) -> Result<Vec<Document>> {
    let foreign = source.read(&lookup.from)?;
    // Matches per key, in collection order; built once for the whole stage.
    let mut index: BTreeMap<Value, Vec<Value>> = BTreeMap::new();
    for candidate in foreign {
        let key = lookup_key(candidate.get_path(&lookup.foreign_field).unwrap_or(&Value::Null));
        index.entry(key).or_default().push(Value::Object(candidate));
    }
    Ok(documents
        .into_iter()
        .map(|mut doc| {
            let local = lookup_key(doc.get_path(&lookup.local_field).unwrap_or(&Value::Null));
            let matches = index.get(&local).cloned().unwrap_or_default();
            doc.set_path(&lookup.as_field, Value::Array(matches));
            doc
        })
        .collect())
}

/// Index key under which values equal by [`compare_values`] coincide.
fn lookup_key(value: &Value) -> Value {
    value.as_f64().map_or_else(|| value.clone(), Value::Float)
}

fn run_unwind(documents: Vec<Document>, path: &str) -> Vec<Document> {
    let mut out = Vec::with_capacity(documents.len());
    for doc in documents {
        match doc.get_path(path) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items.clone() {
                    let mut copy = doc.clone();
                    copy.set_path(path, item);
                    out.push(copy);
                }
            }
            // A scalar unwinds as a one-element array.
            Some(_) => out.push(doc),
        }
    }
    out
}

fn add_fields(mut doc: Document, fields: &FieldMap<Expr>) -> Result<Document> {
    let mut computed = Vec::with_capacity(fields.len());
    for (name, expr) in fields.iter() {
        computed.push((name, eval(expr, &doc)?));
    }
    for (name, value) in computed {
        match value {
            Some(value) => doc.set_path(name, value),
            None => {
                doc.remove_path(name);
            }
        }
    }
    Ok(doc)
}

fn run_project(documents: Vec<Document>, spec: &FieldMap<Projection>) -> Result<Vec<Document>> {
    let inclusion = spec
        .iter()
        .any(|(_, p)| !matches!(p, Projection::Exclude));
    if inclusion {
        if let Some((field, _)) = spec
            .iter()
            .find(|(name, p)| *name != "_id" && matches!(p, Projection::Exclude))
        {
            return Err(StoreError::Aggregation {
                stage: "$project",
                reason: format!("cannot exclude '{field}' in an inclusion projection"),
            });
        }
        documents
            .iter()
            .map(|doc| include_fields(doc, spec))
            .collect()
    } else {
        Ok(documents
            .into_iter()
            .map(|mut doc| {
                for name in spec.keys() {
                    doc.remove_path(name);
                }
                doc
            })
            .collect())
    }
}

fn include_fields(doc: &Document, spec: &FieldMap<Projection>) -> Result<Document> {
    let mut out = Document::new();
    if spec.get("_id").is_none()
        && let Some(id) = doc.get("_id")
    {
        out.insert("_id", id.clone());
    }
    for (name, projection) in spec.iter() {
        let value = match projection {
            Projection::Exclude => None,
            Projection::Include => doc.get_path(name).cloned(),
            Projection::Expr(expr) => eval(expr, doc)?,
        };
        if let Some(value) = value {
            out.set_path(name, value);
        }
    }
    Ok(out)
}

fn run_group(documents: &[Document], group: &Group) -> Result<Vec<Document>> {
    // First-seen key order keeps the output deterministic.
    let mut keys: Vec<Value> = Vec::new();
    let mut states: Vec<Vec<Value>> = Vec::new();

    for doc in documents {
        let key = eval(&group.id, doc)?.unwrap_or(Value::Null);
        let slot = match keys.iter().position(|k| values_match(k, &key)) {
            Some(idx) => idx,
            None => {
                keys.push(key);
                states.push(
                    group
                        .accumulators
                        .iter()
                        .map(|(_, acc)| match acc {
                            Accumulator::Sum(_) => Value::Int(0),
                            Accumulator::Push(_) => Value::Array(Vec::new()),
                        })
                        .collect(),
                );
                keys.len() - 1
            }
        };
        for (state, (_, acc)) in states[slot].iter_mut().zip(group.accumulators.iter()) {
            match acc {
                Accumulator::Sum(expr) => {
                    if let Some(value) = eval(expr, doc)? {
                        *state = add_numbers(state, &value);
                    }
                }
                Accumulator::Push(expr) => {
                    if let (Some(value), Value::Array(items)) = (eval(expr, doc)?, &mut *state) {
                        items.push(value);
                    }
                }
            }
        }
    }

    Ok(keys
        .into_iter()
        .zip(states)
        .map(|(key, values)| {
            let mut out = Document::with_capacity(values.len() + 1);
            out.insert("_id", key);
            for ((name, _), value) in group.accumulators.iter().zip(values) {
                out.insert(name, value);
            }
            out
        })
        .collect())
}

/// `$sum` ignores non-numeric values; ints stay ints until a double appears.
fn add_numbers(total: &Value, value: &Value) -> Value {
    match (total, value) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map_or_else(|| Value::Float(*a as f64 + *b as f64), Value::Int),
        (total, value) => match (total.as_f64(), value.as_f64()) {
            (Some(a), Some(b)) => Value::Float(a + b),
            _ => total.clone(),
        },
    }
}

fn run_sort(mut documents: Vec<Document>, keys: &FieldMap<SortOrder>) -> Vec<Document> {
    documents.sort_by(|a, b| {
        for (path, order) in keys.iter() {
            let left = a.get_path(path).unwrap_or(&Value::Null);
            let right = b.get_path(path).unwrap_or(&Value::Null);
            let ordering = match order {
                SortOrder::Ascending => compare_values(left, right),
                SortOrder::Descending => compare_values(right, left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatview_pipeline::{FieldPath, type_count_pipeline};

    struct Collections(BTreeMap<String, Vec<Document>>);

    impl CollectionSource for Collections {
        fn read(&self, name: &str) -> Result<Vec<Document>> {
            Ok(self.0.get(name).cloned().unwrap_or_default())
        }
    }

    fn doc(fields: &[(&str, Value)]) -> Document {
        fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn no_source() -> Collections {
        Collections(BTreeMap::new())
    }

    #[test]
    fn test_lookup_matches_across_numeric_types() {
        let hospitals = vec![
            doc(&[("_id", Value::Int(0)), ("hospital", Value::from("General"))]),
            doc(&[("_id", Value::Int(1)), ("hospital", Value::from("City"))]),
        ];
        let source = Collections(BTreeMap::from([("hospitals".to_string(), hospitals)]));
        let lookup = Stage::Lookup(Lookup {
            from: "hospitals".to_string(),
            local_field: "ref_hospital".to_string(),
            foreign_field: "_id".to_string(),
            as_field: "hospitalsDocs".to_string(),
        });
        let input = vec![doc(&[("ref_hospital", Value::Float(1.0))])];
        let out = run_pipeline(input, &Pipeline::new(vec![lookup]), &source).unwrap();
        let docs = out[0].get("hospitalsDocs").and_then(Value::as_array).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].as_document().and_then(|d| d.get("hospital")), Some(&Value::from("City")));
    }

    #[test]
    fn test_lookup_keeps_collection_order_per_key() {
        let visits = vec![
            doc(&[("patient", Value::Int(2)), ("ward", Value::from("A"))]),
            doc(&[("patient", Value::Int(1)), ("ward", Value::from("B"))]),
            doc(&[("patient", Value::Float(2.0)), ("ward", Value::from("C"))]),
            doc(&[("ward", Value::from("D"))]),
        ];
        let source = Collections(BTreeMap::from([("visits".to_string(), visits)]));
        let lookup = Stage::Lookup(Lookup {
            from: "visits".to_string(),
            local_field: "id".to_string(),
            foreign_field: "patient".to_string(),
            as_field: "visits".to_string(),
        });
        let input = vec![
            doc(&[("id", Value::Int(2))]),
            doc(&[("id", Value::Int(9))]),
            doc(&[("name", Value::from("no id"))]),
        ];
        let out = run_pipeline(input, &Pipeline::new(vec![lookup]), &source).unwrap();

        let wards = |d: &Document| -> Vec<Value> {
            d.get("visits")
                .and_then(Value::as_array)
                .unwrap()
                .iter()
                .filter_map(|v| v.as_document().and_then(|v| v.get("ward")).cloned())
                .collect()
        };
        assert_eq!(wards(&out[0]), [Value::from("A"), Value::from("C")]);
        assert!(wards(&out[1]).is_empty());
        // A missing local field joins documents whose foreign field is missing.
        assert_eq!(wards(&out[2]), [Value::from("D")]);
    }

    #[test]
    fn test_unwind_is_strict() {
        let input = vec![
            doc(&[("a", Value::Array(vec![Value::Int(1), Value::Int(2)]))]),
            doc(&[("a", Value::Array(vec![]))]),
            doc(&[("a", Value::Null)]),
            doc(&[("b", Value::Int(1))]),
            doc(&[("a", Value::Int(9))]),
        ];
        let pipeline = Pipeline::new(vec![Stage::Unwind(FieldPath::new("a"))]);
        let out = run_pipeline(input, &pipeline, &no_source()).unwrap();
        let values: Vec<&Value> = out.iter().filter_map(|d| d.get("a")).collect();
        assert_eq!(values, [&Value::Int(1), &Value::Int(2), &Value::Int(9)]);
    }

    #[test]
    fn test_add_fields_is_simultaneous() {
        let mut fields = FieldMap::new();
        fields.insert("a", Expr::field("b"));
        fields.insert("b", Expr::field("a"));
        let input = vec![doc(&[("a", Value::Int(1)), ("b", Value::Int(2))])];
        let out = run_pipeline(input, &Pipeline::new(vec![Stage::AddFields(fields)]), &no_source()).unwrap();
        assert_eq!(out[0].get("a"), Some(&Value::Int(2)));
        assert_eq!(out[0].get("b"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_exclusion_projection_removes_paths() {
        let mut spec = FieldMap::new();
        spec.insert("_id", Projection::Exclude);
        spec.insert("patient", Projection::Exclude);
        let input = vec![doc(&[
            ("_id", Value::Int(0)),
            ("age", Value::Int(30)),
            ("patient", Value::Object(Document::new())),
        ])];
        let out = run_pipeline(input, &Pipeline::new(vec![Stage::Project(spec)]), &no_source()).unwrap();
        assert_eq!(out[0].keys().collect::<Vec<_>>(), ["age"]);
    }

    #[test]
    fn test_mixed_projection_rejected() {
        let mut spec = FieldMap::new();
        spec.insert("age", Projection::Include);
        spec.insert("name", Projection::Exclude);
        let input = vec![doc(&[("age", Value::Int(30))])];
        let result = run_pipeline(input, &Pipeline::new(vec![Stage::Project(spec)]), &no_source());
        assert!(matches!(result, Err(StoreError::Aggregation { stage: "$project", .. })));
    }

    #[test]
    fn test_type_counts() {
        let input = vec![
            doc(&[("age", Value::Int(30)), ("name", Value::from("Ann"))]),
            doc(&[("age", Value::Null), ("name", Value::from("Bob"))]),
            doc(&[("age", Value::Int(41)), ("name", Value::from("Cid"))]),
        ];
        let out = run_pipeline(input, &type_count_pipeline(), &no_source()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("_id"), Some(&Value::from("age")));

        let types = out[0].get("types").and_then(Value::as_array).unwrap();
        let counts: Vec<(String, i64)> = types
            .iter()
            .filter_map(Value::as_document)
            .map(|t| {
                (
                    t.get("type").and_then(Value::as_str).unwrap().to_string(),
                    t.get("count").and_then(Value::as_i64).unwrap(),
                )
            })
            .collect();
        assert_eq!(counts, [("int".to_string(), 2), ("null".to_string(), 1)]);
    }

    #[test]
    fn test_type_of_missing() {
        let expr = Expr::Type(Box::new(Expr::field("absent")));
        assert_eq!(eval(&expr, &Document::new()).unwrap(), Some(Value::from("missing")));
    }

    #[test]
    fn test_sort_numbers_together() {
        let mut keys = FieldMap::new();
        keys.insert("n", SortOrder::Ascending);
        let input = vec![
            doc(&[("n", Value::Int(3))]),
            doc(&[("n", Value::Float(2.5))]),
            doc(&[("n", Value::Null)]),
        ];
        let out = run_pipeline(input, &Pipeline::new(vec![Stage::Sort(keys)]), &no_source()).unwrap();
        let ns: Vec<&Value> = out.iter().filter_map(|d| d.get("n")).collect();
        assert_eq!(ns, [&Value::Null, &Value::Float(2.5), &Value::Int(3)]);
    }
}
