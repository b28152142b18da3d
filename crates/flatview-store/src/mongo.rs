//! MongoDB-backed document store.
//!
//! Adapts the driver's blocking API to [`DocumentStore`]. Documents cross
//! the boundary through [`to_bson`] and [`from_bson`]; commands and
//! pipelines are sent in the same wire shape the in-memory store accepts.

use chrono::DateTime;
use flatview_model::{Document, Value};
use flatview_pipeline::Pipeline;
use mongodb::bson::{self, Bson, doc};
use mongodb::error::ErrorKind;
use mongodb::results::CollectionType;
use mongodb::sync::Client;
use serde_json::Value as Json;
use tracing::{debug, info};

use crate::client::{CollectionFilter, CollectionInfo, CollectionKind, DocumentStore};
use crate::command::{Command, CommandResult};
use crate::error::Result;

pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    /// Build a client for `uri`. The driver connects lazily, so an
    /// unreachable server surfaces on the first operation.
    pub fn connect(uri: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)?;
        info!("Connected mongodb client");
        Ok(Self { client })
    }

    fn collection(&self, database: &str, name: &str) -> mongodb::sync::Collection<bson::Document> {
        self.client.database(database).collection(name)
    }
}

impl DocumentStore for MongoStore {
    fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self.client.list_database_names().run()?)
    }

    fn list_collections(&self, database: &str, filter: CollectionFilter) -> Result<Vec<CollectionInfo>> {
        let db = self.client.database(database);
        let cursor = match filter {
            CollectionFilter::All => db.list_collections().run()?,
            CollectionFilter::Only(kind) => db
                .list_collections()
                .filter(doc! { "type": kind.as_str() })
                .run()?,
        };
        let mut out = Vec::new();
        for spec in cursor {
            let spec = spec?;
            let kind = match spec.collection_type {
                CollectionType::View => CollectionKind::View,
                _ => CollectionKind::Collection,
            };
            out.push(CollectionInfo { name: spec.name, kind });
        }
        Ok(out)
    }

    fn create_collection(&mut self, database: &str, name: &str) -> Result<()> {
        self.client.database(database).create_collection(name).run()?;
        debug!(database = %database, collection = %name, "Created collection");
        Ok(())
    }

    fn insert_many(&mut self, database: &str, collection: &str, documents: Vec<Document>) -> Result<Vec<Value>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let count = documents.len();
        let bson_docs: Vec<bson::Document> = documents.into_iter().map(to_bson_document).collect();
        let result = self.collection(database, collection).insert_many(bson_docs).run()?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        debug!(database = %database, collection = %collection, documents = count, "Inserted documents");
        Ok(ids.into_iter().map(|(_, id)| from_bson(id)).collect())
    }

    fn aggregate(&self, database: &str, collection: &str, pipeline: &Pipeline) -> Result<Vec<Document>> {
        let stages = pipeline_to_bson(pipeline)?;
        let cursor = self.collection(database, collection).aggregate(stages).run()?;
        let mut out = Vec::new();
        for doc in cursor {
            out.push(from_bson_document(doc?));
        }
        Ok(out)
    }

    fn run_command(&mut self, database: &str, command: &Command) -> Result<CommandResult> {
        let body = json_to_document(&command.to_json())?;
        match self.client.database(database).run_command(body).run() {
            Ok(reply) => Ok(CommandResult {
                raw: Bson::Document(reply).into_relaxed_extjson(),
            }),
            Err(err) => {
                // The driver raises server-side failures; hand them back as replies.
                if let ErrorKind::Command(failure) = err.kind.as_ref() {
                    return Ok(CommandResult::error(
                        failure.code,
                        &failure.code_name,
                        failure.message.clone(),
                    ));
                }
                Err(err.into())
            }
        }
    }
}

// =============================================================================
// CONVERSION
// =============================================================================

fn json_to_document(json: &Json) -> Result<bson::Document> {
    Ok(bson::to_document(json)?)
}

fn pipeline_to_bson(pipeline: &Pipeline) -> Result<Vec<bson::Document>> {
    match pipeline.to_json() {
        Json::Array(stages) => stages.iter().map(json_to_document).collect(),
        other => Ok(vec![json_to_document(&other)?]),
    }
}

pub fn to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::String(s) => Bson::String(s),
        Value::Int(v) => Bson::Int64(v),
        Value::Float(v) => Bson::Double(v),
        Value::DateTime(dt) => Bson::DateTime(bson::DateTime::from_millis(dt.and_utc().timestamp_millis())),
        Value::Array(items) => Bson::Array(items.into_iter().map(to_bson).collect()),
        Value::Object(doc) => Bson::Document(to_bson_document(doc)),
    }
}

pub fn to_bson_document(doc: Document) -> bson::Document {
    doc.into_iter().map(|(k, v)| (k, to_bson(v))).collect()
}

/// Read a stored value. Types the model has no variant for keep a readable
/// form: booleans as 0/1, identifiers and the rest as their text.
pub fn from_bson(value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::String(s) => Value::String(s),
        Bson::Int32(v) => Value::Int(i64::from(v)),
        Bson::Int64(v) => Value::Int(v),
        Bson::Double(v) => Value::Float(v),
        Bson::Boolean(v) => Value::Int(i64::from(v)),
        Bson::DateTime(dt) => DateTime::from_timestamp_millis(dt.timestamp_millis())
            .map_or(Value::Null, |utc| Value::DateTime(utc.naive_utc())),
        Bson::Array(items) => Value::Array(items.into_iter().map(from_bson).collect()),
        Bson::Document(doc) => Value::Object(from_bson_document(doc)),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => Value::String(other.to_string()),
    }
}

pub fn from_bson_document(doc: bson::Document) -> Document {
    doc.into_iter().map(|(k, v)| (k, from_bson(v))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use flatview_model::{NormalizeOp, SerializeOp};
    use flatview_pipeline::build_pipeline;

    fn row(fields: &[(&str, Value)]) -> Document {
        fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_document_conversion_keeps_order_and_types() {
        let admitted = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let doc = row(&[
            ("_id", Value::Int(0)),
            ("billing_amount", Value::Float(18856.28)),
            ("date_of_admission", Value::DateTime(admitted)),
            ("doctor", Value::Null),
            ("patient", Value::Object(row(&[("name", Value::from("Ann"))]))),
        ]);
        let stored = to_bson_document(doc.clone());
        assert_eq!(
            stored.keys().collect::<Vec<_>>(),
            ["_id", "billing_amount", "date_of_admission", "doctor", "patient"]
        );
        assert_eq!(from_bson_document(stored), doc);
    }

    #[test]
    fn test_foreign_types_read_back() {
        assert_eq!(from_bson(Bson::Int32(7)), Value::Int(7));
        assert_eq!(from_bson(Bson::Boolean(true)), Value::Int(1));
        let oid = bson::oid::ObjectId::new();
        assert_eq!(from_bson(Bson::ObjectId(oid)), Value::String(oid.to_hex()));
    }

    #[test]
    fn test_command_body_leads_with_command_name() {
        let command = Command::Create {
            name: "flatten_view".to_string(),
            view_on: "admissions".to_string(),
            pipeline: build_pipeline(
                &[NormalizeOp::new(["hospital"], "ref_hospital", "hospitals")],
                &[SerializeOp::new(["name"], "patient")],
            ),
        };
        let body = json_to_document(&command.to_json()).unwrap();
        assert_eq!(body.keys().next().map(String::as_str), Some("create"));
        assert_eq!(body.get_str("viewOn").unwrap(), "admissions");
        // $lookup, $unwind, $addFields, $project
        assert_eq!(body.get_array("pipeline").unwrap().len(), 4);
    }
}
