//! Synthesized schema values: ordered field tables with parsing and
//! introspection
//!
//! A [`Schema`] is one side (request or response) of a synthesized
//! serializer. It can parse an untyped JSON mapping into a normalized one and
//! render itself as a JSON-Schema-style object for documentation generation.

use serde_json::{json, Map, Value};

use crate::error::{capitalize, ensure_sentence, ApiError, FieldError};
use crate::serializers::fields::{FieldDefault, FieldDescriptor, FieldType};

/// One side of a synthesized request/response schema pair
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub(crate) fn new(name: String, fields: Vec<FieldDescriptor>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered field table
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Parse an untyped JSON mapping against this schema.
    ///
    /// Missing fields fall back to their default; missing required fields and
    /// type mismatches are collected into per-field error descriptors. A
    /// `null` input is accepted only for fields whose default is `null`.
    /// Unknown keys are ignored.
    pub fn parse(&self, input: &Value) -> Result<Map<String, Value>, ApiError> {
        let object = match input {
            Value::Object(object) => object,
            _ => {
                return Err(ApiError::bad_request("Value is not a valid mapping."));
            }
        };

        let mut output = Map::with_capacity(self.fields.len());
        let mut errors: Vec<FieldError> = Vec::new();

        for field in &self.fields {
            match object.get(&field.name) {
                Some(Value::Null) if field.default == FieldDefault::Value(Value::Null) => {
                    output.insert(field.name.clone(), Value::Null);
                }
                Some(value) => match field.ty.validate(value) {
                    Ok(normalized) => {
                        output.insert(field.name.clone(), normalized);
                    }
                    Err(message) => {
                        errors.push(FieldError::new(
                            &field.name,
                            ensure_sentence(&capitalize(&message)),
                            400,
                        ));
                    }
                },
                None => match &field.default {
                    FieldDefault::Value(default) => {
                        output.insert(field.name.clone(), default.clone());
                    }
                    FieldDefault::Required => {
                        errors.push(FieldError::new(&field.name, "Field required.", 400));
                    }
                },
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(ApiError::bad_request("Validation error.").with_fields(errors))
        }
    }

    /// Render this schema as a JSON-Schema-style object
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::with_capacity(self.fields.len());
        let mut required: Vec<Value> = Vec::new();

        for field in &self.fields {
            let mut property = type_schema(&field.ty);
            match &field.default {
                FieldDefault::Required => required.push(Value::String(field.name.clone())),
                FieldDefault::Value(default) => {
                    if let Value::Object(object) = &mut property {
                        object.insert("default".to_string(), default.clone());
                    }
                }
            }
            properties.insert(field.name.clone(), property);
        }

        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn type_schema(ty: &FieldType) -> Value {
    match ty {
        FieldType::Bool => json!({"type": "boolean"}),
        FieldType::Int => json!({"type": "integer"}),
        FieldType::Float => json!({"type": "number"}),
        FieldType::Str => json!({"type": "string"}),
        FieldType::DateTime => json!({"type": "string", "format": "date-time"}),
        FieldType::List(el) | FieldType::VarTuple(el) => {
            json!({"type": "array", "items": type_schema(el)})
        }
        FieldType::Set(el) => {
            json!({"type": "array", "uniqueItems": true, "items": type_schema(el)})
        }
        FieldType::Map(v) => json!({"type": "object", "additionalProperties": type_schema(v)}),
        FieldType::Tuple(els) => {
            let items: Vec<Value> = els.iter().map(type_schema).collect();
            json!({
                "type": "array",
                "prefixItems": items,
                "minItems": els.len(),
                "maxItems": els.len(),
            })
        }
    }
}
