//! Serializer configuration: backing model binding and field visibility sets
//!
//! The configuration mirrors the four-knob sidecar of a serializer
//! declaration: an optional backing model, plus `exclude`,
//! `write_only_fields` and `read_only_fields` sets. Configurations combine by
//! set union, so the order in which layers are merged does not matter.

use std::collections::BTreeSet;

use crate::db::MongoModel;
use crate::serializers::fields::{FieldDescriptor, FieldVisibility};

/// Field table and collection of a backing storage model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBinding {
    pub collection: String,
    pub fields: Vec<FieldDescriptor>,
}

impl ModelBinding {
    /// Capture the declared fields and collection of a model type
    pub fn of<M: MongoModel>() -> Self {
        Self {
            collection: M::collection_name().to_string(),
            fields: M::field_descriptors(),
        }
    }
}

/// Visibility configuration of a serializer declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializerMeta {
    pub model: Option<ModelBinding>,
    pub exclude: BTreeSet<String>,
    pub write_only_fields: BTreeSet<String>,
    pub read_only_fields: BTreeSet<String>,
}

impl SerializerMeta {
    /// Empty configuration: no model, all sets empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a backing model whose fields seed the synthesized schemas
    pub fn model<M: MongoModel>(mut self) -> Self {
        self.model = Some(ModelBinding::of::<M>());
        self
    }

    /// Hide a field from both schemas
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude.insert(name.into());
        self
    }

    /// Accept a field in requests but never serialize it back out
    pub fn write_only(mut self, name: impl Into<String>) -> Self {
        self.write_only_fields.insert(name.into());
        self
    }

    /// Serialize a field in responses but reject it in requests
    pub fn read_only(mut self, name: impl Into<String>) -> Self {
        self.read_only_fields.insert(name.into());
        self
    }

    /// Combine two configurations by set union.
    ///
    /// `self` wins for the model binding; the sets merge commutatively.
    pub fn merged_with(&self, other: &SerializerMeta) -> SerializerMeta {
        SerializerMeta {
            model: self.model.clone().or_else(|| other.model.clone()),
            exclude: self.exclude.union(&other.exclude).cloned().collect(),
            write_only_fields: self
                .write_only_fields
                .union(&other.write_only_fields)
                .cloned()
                .collect(),
            read_only_fields: self
                .read_only_fields
                .union(&other.read_only_fields)
                .cloned()
                .collect(),
        }
    }

    /// Classify a field name by the visibility sets
    pub fn classify(&self, name: &str) -> FieldVisibility {
        if self.exclude.contains(name) {
            FieldVisibility::Excluded
        } else if self.read_only_fields.contains(name) {
            FieldVisibility::ReadOnly
        } else if self.write_only_fields.contains(name) {
            FieldVisibility::WriteOnly
        } else {
            FieldVisibility::Normal
        }
    }

    /// Names hidden from the request schema
    pub(crate) fn excluded_for_request(&self) -> BTreeSet<String> {
        self.exclude.union(&self.read_only_fields).cloned().collect()
    }

    /// Names hidden from the response schema
    pub(crate) fn excluded_for_response(&self) -> BTreeSet<String> {
        self.exclude
            .union(&self.write_only_fields)
            .cloned()
            .collect()
    }
}
