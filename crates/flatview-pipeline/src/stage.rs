//! Pipeline stages and their wire form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::error::{PipelineError, Result};
use crate::expr::{Accumulator, Expr, FieldMap, FieldPath, Projection, SortOrder, operator};

/// `$lookup`: equality join from another collection into an array field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub from: String,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
}

/// `$group`: one output document per distinct `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: Expr,
    pub accumulators: FieldMap<Accumulator>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Lookup(Lookup),
    /// Strict unwind: documents whose array is missing, null or empty drop out.
    Unwind(FieldPath),
    /// All right-hand sides read the input document, never each other.
    AddFields(FieldMap<Expr>),
    Project(FieldMap<Projection>),
    Group(Group),
    Sort(FieldMap<SortOrder>),
}

impl Stage {
    /// Wire name, e.g. `$lookup`.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Lookup(_) => "$lookup",
            Stage::Unwind(_) => "$unwind",
            Stage::AddFields(_) => "$addFields",
            Stage::Project(_) => "$project",
            Stage::Group(_) => "$group",
            Stage::Sort(_) => "$sort",
        }
    }

    pub fn to_json(&self) -> Json {
        let body = match self {
            Stage::Lookup(lookup) => {
                let mut map = Map::new();
                map.insert("from".to_string(), Json::from(lookup.from.as_str()));
                map.insert("localField".to_string(), Json::from(lookup.local_field.as_str()));
                map.insert("foreignField".to_string(), Json::from(lookup.foreign_field.as_str()));
                map.insert("as".to_string(), Json::from(lookup.as_field.as_str()));
                Json::Object(map)
            }
            Stage::Unwind(path) => Json::String(path.to_reference()),
            Stage::AddFields(fields) => fields.to_json_with(Expr::to_json),
            Stage::Project(fields) => fields.to_json_with(Projection::to_json),
            Stage::Group(group) => {
                let mut map = Map::new();
                map.insert("_id".to_string(), group.id.to_json());
                for (name, acc) in group.accumulators.iter() {
                    map.insert(name.to_string(), acc.to_json());
                }
                Json::Object(map)
            }
            Stage::Sort(keys) => keys.to_json_with(|order| order.to_json()),
        };
        operator(self.name(), body)
    }

    pub fn from_json(json: &Json) -> Result<Self> {
        let map = json.as_object().filter(|m| m.len() == 1).ok_or_else(|| {
            PipelineError::Malformed {
                stage: "pipeline",
                reason: format!("expected a single-key stage document, got {json}"),
            }
        })?;
        let Some((name, body)) = map.iter().next() else {
            return Err(PipelineError::Malformed {
                stage: "pipeline",
                reason: "empty stage document".to_string(),
            });
        };
        match name.as_str() {
            "$lookup" => parse_lookup(body).map(Stage::Lookup),
            "$unwind" => parse_unwind(body).map(Stage::Unwind),
            "$addFields" => {
                FieldMap::from_json_with(object(body, "$addFields")?, Expr::from_json).map(Stage::AddFields)
            }
            "$project" => FieldMap::from_json_with(object(body, "$project")?, Projection::from_json)
                .map(Stage::Project),
            "$group" => parse_group(body).map(Stage::Group),
            "$sort" => {
                FieldMap::from_json_with(object(body, "$sort")?, SortOrder::from_json).map(Stage::Sort)
            }
            other => Err(PipelineError::UnknownStage {
                name: other.to_string(),
            }),
        }
    }
}

fn object<'a>(body: &'a Json, stage: &'static str) -> Result<&'a Map<String, Json>> {
    body.as_object().ok_or_else(|| PipelineError::Malformed {
        stage,
        reason: format!("expected a document, got {body}"),
    })
}

fn parse_lookup(body: &Json) -> Result<Lookup> {
    let map = object(body, "$lookup")?;
    let field = |key: &str| -> Result<String> {
        map.get(key)
            .and_then(Json::as_str)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::Malformed {
                stage: "$lookup",
                reason: format!("missing string field '{key}'"),
            })
    };
    Ok(Lookup {
        from: field("from")?,
        local_field: field("localField")?,
        foreign_field: field("foreignField")?,
        as_field: field("as")?,
    })
}

fn parse_unwind(body: &Json) -> Result<FieldPath> {
    // Long form {path: "$field"} is accepted on read.
    let raw = match body {
        Json::String(s) => Some(s.as_str()),
        Json::Object(map) => map.get("path").and_then(Json::as_str),
        _ => None,
    };
    raw.and_then(FieldPath::from_reference)
        .ok_or_else(|| PipelineError::Malformed {
            stage: "$unwind",
            reason: format!("expected a field path, got {body}"),
        })
}

fn parse_group(body: &Json) -> Result<Group> {
    let map = object(body, "$group")?;
    let id = map.get("_id").ok_or_else(|| PipelineError::Malformed {
        stage: "$group",
        reason: "missing _id".to_string(),
    })?;
    let mut accumulators = FieldMap::new();
    for (name, value) in map.iter().filter(|(k, _)| k.as_str() != "_id") {
        accumulators.insert(name.clone(), Accumulator::from_json(value)?);
    }
    Ok(Group {
        id: Expr::from_json(id)?,
        accumulators,
    })
}

/// An ordered list of stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub fn to_json(&self) -> Json {
        Json::Array(self.stages.iter().map(Stage::to_json).collect())
    }

    pub fn from_json(json: &Json) -> Result<Self> {
        let items = json.as_array().ok_or_else(|| PipelineError::Malformed {
            stage: "pipeline",
            reason: format!("expected an array of stages, got {json}"),
        })?;
        items.iter().map(Stage::from_json).collect::<Result<_>>().map(Self::new)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_default()
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        Stage::from_json(&json).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Pipeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.stages.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pipeline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<Stage>::deserialize(deserializer).map(Self::new)
    }
}
