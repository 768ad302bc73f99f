//! Serializer declarations and schema synthesis
//!
//! A [`Serializer`] is a declarative description of desired input/output
//! fields, optionally backed by a storage model. [`Serializer::synthesize`]
//! derives the request/response schema pair from it, once, producing plain
//! immutable values: no types are generated at runtime.
//!
//! Synthesis works the same way regardless of a model being bound, so a
//! serializer with only its own fields is perfectly valid.

use mongodb::bson::{self, Document};
use mongodb::results::UpdateResult;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::db::{DbError, MongoClient};
use crate::serializers::fields::FieldDescriptor;
use crate::serializers::meta::{ModelBinding, SerializerMeta};
use crate::serializers::schema::Schema;

/// Attribute names never copied from `extras` onto a synthesized schema
const RESERVED_EXTRAS: [&str; 3] = ["meta", "response", "config"];

/// Errors from persistence operations proxied through a synthesized schema
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The serializer was declared without a backing model
    #[error("serializer has no backing model bound")]
    NoModelBound,

    #[error("failed to convert value to BSON: {0}")]
    Bson(#[from] bson::ser::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// A declarative serializer definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Serializer {
    name: String,
    fields: Vec<FieldDescriptor>,
    meta: SerializerMeta,
    extras: Vec<(String, Value)>,
}

impl Serializer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare an own field. Re-declaring a name replaces the earlier
    /// declaration in place.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        overlay(&mut self.fields, field);
        self
    }

    /// Set the visibility configuration
    pub fn meta(mut self, meta: SerializerMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Attach a custom attribute (constant, documentation value, ...) that is
    /// carried onto the synthesized request schema.
    pub fn extra(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if let Some(entry) = self.extras.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.extras.push((name, value));
        }
        self
    }

    /// Own field table, in declaration order
    pub fn own_fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn meta_ref(&self) -> &SerializerMeta {
        &self.meta
    }

    /// Derive the request/response schema pair.
    ///
    /// Each side starts from the backing model's fields (skipping the names
    /// hidden on that side), then the serializer's own fields overlay them:
    /// a same-named own field replaces the model's entry in place, so type
    /// and default come from the local declaration. The response schema is
    /// built first and attached to the request schema as its companion.
    pub fn synthesize(&self) -> SynthesizedSchema {
        let response = self.build_side(
            &self.meta.excluded_for_response(),
            format!("{}Response", self.name),
        );
        let request = self.build_side(&self.meta.excluded_for_request(), self.name.clone());

        let extras: Vec<(String, Value)> = self
            .extras
            .iter()
            .filter(|(name, _)| {
                !name.starts_with('_') && !RESERVED_EXTRAS.contains(&name.as_str())
            })
            .cloned()
            .collect();

        SynthesizedSchema {
            request,
            response,
            meta: self.meta.clone(),
            extras,
        }
    }

    fn build_side(
        &self,
        excluded: &std::collections::BTreeSet<String>,
        name: String,
    ) -> Schema {
        let mut fields: Vec<FieldDescriptor> = Vec::new();

        if let Some(binding) = &self.meta.model {
            for field in &binding.fields {
                if !excluded.contains(&field.name) {
                    overlay(&mut fields, field.clone());
                }
            }
        }

        for field in &self.fields {
            if !excluded.contains(&field.name) {
                overlay(&mut fields, field.clone());
            }
        }

        Schema::new(name, fields)
    }
}

/// Insert or replace a same-named field, keeping its original position
fn overlay(fields: &mut Vec<FieldDescriptor>, field: FieldDescriptor) {
    if let Some(existing) = fields.iter_mut().find(|f| f.name == field.name) {
        *existing = field;
    } else {
        fields.push(field);
    }
}

/// The synthesized request schema together with its response companion
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSchema {
    request: Schema,
    response: Schema,
    meta: SerializerMeta,
    extras: Vec<(String, Value)>,
}

impl SynthesizedSchema {
    /// Request-facing schema (read-only fields removed)
    pub fn request(&self) -> &Schema {
        &self.request
    }

    /// Companion response schema (write-only fields removed)
    pub fn response(&self) -> &Schema {
        &self.response
    }

    /// Backing model binding, when one was declared
    pub fn model(&self) -> Option<&ModelBinding> {
        self.meta.model.as_ref()
    }

    pub fn meta(&self) -> &SerializerMeta {
        &self.meta
    }

    /// Custom attributes carried over from the declaration
    pub fn extras(&self) -> &[(String, Value)] {
        &self.extras
    }

    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extras
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Parse a request body against the request schema
    pub fn parse(&self, input: &Value) -> Result<Map<String, Value>, crate::error::ApiError> {
        self.request.parse(input)
    }

    /// Strip `exclude`d names from raw DB documents (used by pagination)
    pub fn sanitize_list(&self, mut documents: Vec<Document>) -> Vec<Document> {
        for document in &mut documents {
            for name in &self.meta.exclude {
                document.remove(name);
            }
        }
        documents
    }

    /// Shape a parsed mapping for a response: drops `_id`, excluded and
    /// write-only names, keeps everything else.
    pub fn to_response(&self, data: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::with_capacity(data.len());
        for (name, value) in data {
            if name == "_id"
                || self.meta.exclude.contains(name)
                || self.meta.write_only_fields.contains(name)
            {
                continue;
            }
            out.insert(name.clone(), value.clone());
        }
        out
    }

    /// Insert a parsed mapping into the backing model's collection.
    ///
    /// Returns the generated document id.
    pub async fn save(
        &self,
        client: &MongoClient,
        data: &Map<String, Value>,
    ) -> Result<i64, SchemaError> {
        let binding = self.meta.model.as_ref().ok_or(SchemaError::NoModelBound)?;
        let document = bson::to_document(data)?;
        let id = client.insert_document(&binding.collection, document).await?;
        Ok(id)
    }

    /// Update the first document matching `filter` in the backing model's
    /// collection. Names in `array_fields` are appended with `$push {$each}`,
    /// the rest are `$set`.
    pub async fn update_one(
        &self,
        client: &MongoClient,
        filter: Document,
        data: &Map<String, Value>,
        array_fields: &[&str],
    ) -> Result<UpdateResult, SchemaError> {
        let binding = self.meta.model.as_ref().ok_or(SchemaError::NoModelBound)?;
        let update = build_update(data, array_fields)?;
        let result = client
            .update_one_raw(&binding.collection, filter, update)
            .await?;
        Ok(result)
    }

    /// Like [`Self::update_one`], applied to every matching document
    pub async fn update_many(
        &self,
        client: &MongoClient,
        filter: Document,
        data: &Map<String, Value>,
        array_fields: &[&str],
    ) -> Result<UpdateResult, SchemaError> {
        let binding = self.meta.model.as_ref().ok_or(SchemaError::NoModelBound)?;
        let update = build_update(data, array_fields)?;
        let result = client
            .update_many_raw(&binding.collection, filter, update)
            .await?;
        Ok(result)
    }
}

fn build_update(
    data: &Map<String, Value>,
    array_fields: &[&str],
) -> Result<Document, bson::ser::Error> {
    let mut set = Document::new();
    let mut push = Document::new();

    for (name, value) in data {
        let value = bson::to_bson(value)?;
        if array_fields.contains(&name.as_str()) {
            push.insert(name, bson::doc! {"$each": value});
        } else {
            set.insert(name, value);
        }
    }

    let mut update = Document::new();
    if !push.is_empty() {
        update.insert("$push", push);
    }
    if !set.is_empty() {
        update.insert("$set", set);
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializers::fields::FieldType;
    use serde_json::json;

    #[test]
    fn test_overlay_replaces_in_place() {
        let mut fields = vec![
            FieldDescriptor::with_default("a", FieldType::Int, json!(1)),
            FieldDescriptor::required("b", FieldType::Str),
        ];
        overlay(
            &mut fields,
            FieldDescriptor::required("a", FieldType::Str),
        );
        assert_eq!(fields[0].name, "a");
        assert_eq!(fields[0].ty, FieldType::Str);
        assert_eq!(fields[1].name, "b");
    }

    #[test]
    fn test_extras_filtered_on_synthesis() {
        let schema = Serializer::new("Custom")
            .extra("version", json!(2))
            .extra("_private", json!("hidden"))
            .extra("meta", json!("reserved"))
            .synthesize();

        assert_eq!(schema.extra("version"), Some(&json!(2)));
        assert!(schema.extra("_private").is_none());
        assert!(schema.extra("meta").is_none());
    }

    #[test]
    fn test_build_update_splits_set_and_push() {
        let mut data = Map::new();
        data.insert("name".to_string(), json!("x"));
        data.insert("tags".to_string(), json!(["a", "b"]));

        let update = build_update(&data, &["tags"]).unwrap();
        let set = update.get_document("$set").unwrap();
        assert!(set.contains_key("name"));
        assert!(!set.contains_key("tags"));
        let push = update.get_document("$push").unwrap();
        let each = push.get_document("tags").unwrap();
        assert!(each.contains_key("$each"));
    }

    #[test]
    fn test_build_update_without_array_fields() {
        let mut data = Map::new();
        data.insert("name".to_string(), json!("x"));

        let update = build_update(&data, &[]).unwrap();
        assert!(update.contains_key("$set"));
        assert!(!update.contains_key("$push"));
    }
}
