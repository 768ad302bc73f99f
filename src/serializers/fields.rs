//! Field descriptors for serializer schema synthesis
//!
//! A schema is an ordered list of [`FieldDescriptor`]s. The declared type of a
//! field is a closed [`FieldType`] enum, so container multiplicity (list, set,
//! map, tuple) is always carried alongside the element type and can never be
//! flattened away during synthesis.

use chrono::DateTime;
use serde_json::Value;

/// Declared type of a serializer field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
    DateTime,
    /// Ordered sequence of one element type
    List(Box<FieldType>),
    /// Unordered collection, duplicates dropped on parse
    Set(Box<FieldType>),
    /// String-keyed mapping with one value type
    Map(Box<FieldType>),
    /// Fixed-size tuple, one type per position
    Tuple(Vec<FieldType>),
    /// Variable-size tuple, one repeated element type
    VarTuple(Box<FieldType>),
}

impl FieldType {
    /// Shorthand constructors for container types
    pub fn list(element: FieldType) -> Self {
        FieldType::List(Box::new(element))
    }

    pub fn set(element: FieldType) -> Self {
        FieldType::Set(Box::new(element))
    }

    pub fn map(value: FieldType) -> Self {
        FieldType::Map(Box::new(value))
    }

    pub fn var_tuple(element: FieldType) -> Self {
        FieldType::VarTuple(Box::new(element))
    }

    /// Human-readable type name used in error messages
    pub fn type_name(&self) -> String {
        match self {
            FieldType::Bool => "bool".to_string(),
            FieldType::Int => "int".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::Str => "str".to_string(),
            FieldType::DateTime => "datetime".to_string(),
            FieldType::List(el) => format!("list[{}]", el.type_name()),
            FieldType::Set(el) => format!("set[{}]", el.type_name()),
            FieldType::Map(v) => format!("map[str, {}]", v.type_name()),
            FieldType::Tuple(els) => {
                let names: Vec<String> = els.iter().map(|e| e.type_name()).collect();
                format!("tuple[{}]", names.join(", "))
            }
            FieldType::VarTuple(el) => format!("tuple[{}, ...]", el.type_name()),
        }
    }

    /// Validate an untyped JSON value against this type.
    ///
    /// Returns the normalized value (sets are deduplicated, containers are
    /// validated element-wise) or a message describing the mismatch.
    pub fn validate(&self, value: &Value) -> Result<Value, String> {
        match self {
            FieldType::Bool => match value {
                Value::Bool(_) => Ok(value.clone()),
                _ => Err("value is not a valid boolean".to_string()),
            },
            FieldType::Int => match value.as_i64() {
                Some(_) => Ok(value.clone()),
                None => Err("value is not a valid integer".to_string()),
            },
            FieldType::Float => match value {
                Value::Number(_) => Ok(value.clone()),
                _ => Err("value is not a valid float".to_string()),
            },
            FieldType::Str => match value {
                Value::String(_) => Ok(value.clone()),
                _ => Err("value is not a valid string".to_string()),
            },
            FieldType::DateTime => match value {
                Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                    Ok(_) => Ok(value.clone()),
                    Err(_) => Err("value is not a valid RFC 3339 datetime".to_string()),
                },
                _ => Err("value is not a valid RFC 3339 datetime".to_string()),
            },
            FieldType::List(el) | FieldType::VarTuple(el) => match value {
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(el.validate(item)?);
                    }
                    Ok(Value::Array(out))
                }
                _ => Err(format!("value is not a valid {}", self.type_name())),
            },
            FieldType::Set(el) => match value {
                Value::Array(items) => {
                    let mut out: Vec<Value> = Vec::with_capacity(items.len());
                    for item in items {
                        let normalized = el.validate(item)?;
                        if !out.contains(&normalized) {
                            out.push(normalized);
                        }
                    }
                    Ok(Value::Array(out))
                }
                _ => Err(format!("value is not a valid {}", self.type_name())),
            },
            FieldType::Map(v) => match value {
                Value::Object(entries) => {
                    let mut out = serde_json::Map::with_capacity(entries.len());
                    for (key, entry) in entries {
                        out.insert(key.clone(), v.validate(entry)?);
                    }
                    Ok(Value::Object(out))
                }
                _ => Err(format!("value is not a valid {}", self.type_name())),
            },
            FieldType::Tuple(els) => match value {
                Value::Array(items) => {
                    if items.len() != els.len() {
                        return Err(format!(
                            "value does not have exactly {} items",
                            els.len()
                        ));
                    }
                    let mut out = Vec::with_capacity(items.len());
                    for (ty, item) in els.iter().zip(items) {
                        out.push(ty.validate(item)?);
                    }
                    Ok(Value::Array(out))
                }
                _ => Err(format!("value is not a valid {}", self.type_name())),
            },
        }
    }
}

/// Default of a field, or the marker that it must be provided
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    Required,
    Value(Value),
}

impl FieldDefault {
    pub fn is_required(&self) -> bool {
        matches!(self, FieldDefault::Required)
    }
}

/// A single named field of a schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: FieldType,
    pub default: FieldDefault,
}

impl FieldDescriptor {
    /// A field that must be present in the input
    pub fn required(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: FieldDefault::Required,
        }
    }

    /// A field that falls back to `default` when absent
    pub fn with_default(name: impl Into<String>, ty: FieldType, default: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            default: FieldDefault::Value(default),
        }
    }
}

/// Which side(s) of the request/response pair a field is visible on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldVisibility {
    /// Visible on both sides
    Normal,
    /// Response only: not accepted in requests
    ReadOnly,
    /// Request only: never serialized back out
    WriteOnly,
    /// Hidden on both sides
    Excluded,
}
