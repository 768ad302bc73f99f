//! Schema synthesis tests
//!
//! These cover the serializer-to-schema derivation: field visibility per
//! side, model field inheritance and override, container type preservation,
//! parsing against synthesized schemas and idempotence.

use axum_contrib::db::MongoModel;
use axum_contrib::serializers::{
    FieldDescriptor, FieldType, ModelBinding, Serializer, SerializerMeta,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct Note {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    text: String,
    tags: Vec<String>,
    stars: i64,
}

impl MongoModel for Note {
    fn collection_name() -> &'static str {
        "notes"
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn field_descriptors() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::with_default("id", FieldType::Int, Value::Null),
            FieldDescriptor::required("text", FieldType::Str),
            FieldDescriptor::with_default("tags", FieldType::list(FieldType::Str), json!([])),
            FieldDescriptor::with_default("stars", FieldType::Int, json!(0)),
        ]
    }
}

fn field_names(fields: &[FieldDescriptor]) -> Vec<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}

// ============================================================================
// Without a backing model
// ============================================================================

#[test]
fn test_own_fields_only() {
    let schema = Serializer::new("Plain")
        .field(FieldDescriptor::with_default("a", FieldType::Int, json!(1)))
        .field(FieldDescriptor::required("c", FieldType::Str))
        .synthesize();

    assert_eq!(field_names(schema.request().fields()), vec!["a", "c"]);
    assert_eq!(field_names(schema.response().fields()), vec!["a", "c"]);
}

#[test]
fn test_visibility_sets_without_model() {
    let schema = Serializer::new("Plain")
        .field(FieldDescriptor::with_default("a", FieldType::Int, json!(1)))
        .field(FieldDescriptor::required("c", FieldType::Str))
        .field(FieldDescriptor::with_default("d", FieldType::Int, Value::Null))
        .field(FieldDescriptor::with_default("r", FieldType::Str, json!("const")))
        .meta(
            SerializerMeta::new()
                .exclude("d")
                .write_only("c")
                .read_only("r"),
        )
        .synthesize();

    // request = own − exclude − read_only
    assert_eq!(field_names(schema.request().fields()), vec!["a", "c"]);
    // response = own − exclude − write_only
    assert_eq!(field_names(schema.response().fields()), vec!["a", "r"]);
}

#[test]
fn test_write_only_and_exclude_scenario() {
    // own fields {a: int = 1, c: str, d: int}, write_only = {c}, exclude = {d}
    let schema = Serializer::new("Scenario")
        .field(FieldDescriptor::with_default("a", FieldType::Int, json!(1)))
        .field(FieldDescriptor::required("c", FieldType::Str))
        .field(FieldDescriptor::required("d", FieldType::Int))
        .meta(SerializerMeta::new().write_only("c").exclude("d"))
        .synthesize();

    assert_eq!(field_names(schema.response().fields()), vec!["a"]);
}

#[test]
fn test_field_in_both_visibility_sets_stays_on_one_side_each() {
    let schema = Serializer::new("BothSets")
        .field(FieldDescriptor::required("x", FieldType::Str))
        .meta(SerializerMeta::new().read_only("x").write_only("x"))
        .synthesize();

    // read_only hides it from the request, write_only from the response;
    // it is never hidden from both sides at once.
    assert!(schema.request().field("x").is_none());
    assert!(schema.response().field("x").is_none());

    let read_only = Serializer::new("ReadOnly")
        .field(FieldDescriptor::required("x", FieldType::Str))
        .meta(SerializerMeta::new().read_only("x"))
        .synthesize();
    assert!(read_only.request().field("x").is_none());
    assert!(read_only.response().field("x").is_some());

    let write_only = Serializer::new("WriteOnly")
        .field(FieldDescriptor::required("x", FieldType::Str))
        .meta(SerializerMeta::new().write_only("x"))
        .synthesize();
    assert!(write_only.request().field("x").is_some());
    assert!(write_only.response().field("x").is_none());
}

#[test]
fn test_excluding_unknown_field_is_ignored() {
    let schema = Serializer::new("Tolerant")
        .field(FieldDescriptor::required("a", FieldType::Str))
        .meta(SerializerMeta::new().exclude("no_such_field"))
        .synthesize();

    assert_eq!(field_names(schema.request().fields()), vec!["a"]);
}

// ============================================================================
// With a backing model
// ============================================================================

#[test]
fn test_model_fields_are_inherited() {
    let schema = Serializer::new("NoteSerializer")
        .meta(SerializerMeta::new().model::<Note>())
        .synthesize();

    assert_eq!(
        field_names(schema.request().fields()),
        vec!["id", "text", "tags", "stars"]
    );
    assert_eq!(
        schema.model().map(|m| m.collection.as_str()),
        Some("notes")
    );
}

#[test]
fn test_own_field_overrides_model_field() {
    // `stars` is re-declared locally as a required string
    let schema = Serializer::new("NoteSerializer")
        .field(FieldDescriptor::required("stars", FieldType::Str))
        .meta(SerializerMeta::new().model::<Note>())
        .synthesize();

    for side in [schema.request(), schema.response()] {
        let stars = side.field("stars").unwrap();
        assert_eq!(stars.ty, FieldType::Str);
        assert!(stars.default.is_required());
    }

    // The override keeps the model field's position
    assert_eq!(
        field_names(schema.request().fields()),
        vec!["id", "text", "tags", "stars"]
    );
}

#[test]
fn test_container_types_survive_inheritance() {
    let schema = Serializer::new("NoteSerializer")
        .meta(SerializerMeta::new().model::<Note>())
        .synthesize();

    for side in [schema.request(), schema.response()] {
        let tags = side.field("tags").unwrap();
        assert_eq!(tags.ty, FieldType::list(FieldType::Str));
    }
}

#[test]
fn test_mixed_model_and_own_fields_scenario() {
    // own = {a: (int, 1), c: (str, required)}
    // model = {e: (int, 2), f: (str, required)}, no exclusions
    let model = ModelBinding {
        collection: "things".to_string(),
        fields: vec![
            FieldDescriptor::with_default("e", FieldType::Int, json!(2)),
            FieldDescriptor::required("f", FieldType::Str),
        ],
    };
    let mut meta = SerializerMeta::new();
    meta.model = Some(model);

    let schema = Serializer::new("Mixed")
        .field(FieldDescriptor::with_default("a", FieldType::Int, json!(1)))
        .field(FieldDescriptor::required("c", FieldType::Str))
        .meta(meta)
        .synthesize();

    assert_eq!(
        field_names(schema.request().fields()),
        vec!["e", "f", "a", "c"]
    );

    let parsed = schema.parse(&json!({"c": "2", "f": "4"})).unwrap();
    assert_eq!(parsed["a"], json!(1));
    assert_eq!(parsed["c"], json!("2"));
    assert_eq!(parsed["e"], json!(2));
    assert_eq!(parsed["f"], json!("4"));

    // Omitting either required field fails validation
    let err = schema.parse(&json!({"f": "4"})).unwrap_err();
    assert_eq!(err.detail().fields[0].name, "c");

    let err = schema.parse(&json!({"c": "2"})).unwrap_err();
    assert_eq!(err.detail().fields[0].name, "f");
}

#[test]
fn test_visibility_applies_to_model_fields() {
    let schema = Serializer::new("NoteSerializer")
        .meta(
            SerializerMeta::new()
                .model::<Note>()
                .exclude("id")
                .read_only("stars")
                .write_only("text"),
        )
        .synthesize();

    assert_eq!(field_names(schema.request().fields()), vec!["text", "tags"]);
    assert_eq!(field_names(schema.response().fields()), vec!["tags", "stars"]);
}

// ============================================================================
// Companion response schema
// ============================================================================

#[test]
fn test_response_schema_reachable_from_request_side() {
    let schema = Serializer::new("NoteSerializer")
        .meta(
            SerializerMeta::new()
                .model::<Note>()
                .read_only("stars")
                .write_only("text"),
        )
        .synthesize();

    let response = schema.response();
    assert_eq!(response.name(), "NoteSerializerResponse");
    // Excluded of write-only names, never of read-only names
    assert!(response.field("text").is_none());
    assert!(response.field("stars").is_some());
    // And the request schema is the other way around
    assert!(schema.request().field("text").is_some());
    assert!(schema.request().field("stars").is_none());
}

// ============================================================================
// Extras, idempotence, introspection
// ============================================================================

#[test]
fn test_extras_carried_onto_request_schema() {
    let schema = Serializer::new("NoteSerializer")
        .extra("resource", json!("note"))
        .extra("_internal", json!(true))
        .synthesize();

    assert_eq!(schema.extra("resource"), Some(&json!("note")));
    assert!(schema.extra("_internal").is_none());
}

#[test]
fn test_synthesis_is_idempotent() {
    let serializer = Serializer::new("NoteSerializer")
        .field(FieldDescriptor::required("stars", FieldType::Str))
        .meta(
            SerializerMeta::new()
                .model::<Note>()
                .exclude("id")
                .write_only("text"),
        );

    let first = serializer.synthesize();
    let second = serializer.synthesize();
    assert_eq!(first, second);
}

#[test]
fn test_json_schema_of_synthesized_response() {
    let schema = Serializer::new("NoteSerializer")
        .meta(SerializerMeta::new().model::<Note>().exclude("id"))
        .synthesize();

    let rendered = schema.response().json_schema();
    assert_eq!(rendered["title"], "NoteSerializerResponse");
    assert_eq!(rendered["properties"]["tags"]["type"], "array");
    assert_eq!(rendered["properties"]["tags"]["items"]["type"], "string");
    assert_eq!(rendered["required"], json!(["text"]));
}

// ============================================================================
// Sanitizing and response shaping
// ============================================================================

#[test]
fn test_sanitize_list_strips_excluded() {
    use mongodb::bson::doc;

    let schema = Serializer::new("NoteSerializer")
        .meta(SerializerMeta::new().model::<Note>().exclude("stars"))
        .synthesize();

    let rows = vec![
        doc! {"id": 1, "text": "a", "stars": 9},
        doc! {"id": 2, "text": "b"},
    ];
    let sanitized = schema.sanitize_list(rows);
    assert!(!sanitized[0].contains_key("stars"));
    assert_eq!(sanitized[0].get_str("text").unwrap(), "a");
    assert_eq!(sanitized[1].get_i32("id").unwrap(), 2);
}

#[test]
fn test_to_response_drops_hidden_names() {
    let schema = Serializer::new("NoteSerializer")
        .meta(SerializerMeta::new().exclude("hidden").write_only("secret"))
        .synthesize();

    let mut data = serde_json::Map::new();
    data.insert("_id".to_string(), json!(5));
    data.insert("text".to_string(), json!("hello"));
    data.insert("hidden".to_string(), json!("x"));
    data.insert("secret".to_string(), json!("y"));

    let shaped = schema.to_response(&data);
    assert_eq!(shaped.len(), 1);
    assert_eq!(shaped["text"], json!("hello"));
}
