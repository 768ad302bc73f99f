//! Serializer schema synthesis
//!
//! This module turns a declarative serializer definition (its own fields plus
//! an optional backing model's fields and visibility sets) into two flattened
//! schema values: a request schema that excludes read-only fields and a
//! response schema that excludes write-only fields. Synthesis happens once,
//! when the application assembles its serializers, and the resulting values
//! are immutable.
//!
//! ```no_run
//! use axum_contrib::serializers::{FieldDescriptor, FieldType, Serializer, SerializerMeta};
//! use serde_json::json;
//!
//! let schema = Serializer::new("NoteSerializer")
//!     .field(FieldDescriptor::required("text", FieldType::Str))
//!     .field(FieldDescriptor::with_default("pinned", FieldType::Bool, json!(false)))
//!     .meta(SerializerMeta::new().read_only("pinned"))
//!     .synthesize();
//!
//! let parsed = schema.parse(&json!({"text": "hi"})).unwrap();
//! assert_eq!(parsed["text"], json!("hi"));
//! assert!(schema.response().field("pinned").is_some());
//! ```

mod fields;
mod meta;
mod schema;
mod synthesizer;

pub use fields::{FieldDefault, FieldDescriptor, FieldType, FieldVisibility};
pub use meta::{ModelBinding, SerializerMeta};
pub use schema::Schema;
pub use synthesizer::{SchemaError, Serializer, SynthesizedSchema};
