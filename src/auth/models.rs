//! Token authentication models

use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::token::generate_token;
use crate::db::MongoModel;
use crate::serializers::{FieldDescriptor, FieldType};

/// Default TTL of a token document, matching the `tokens` TTL index
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 86400;

/// An account that can authenticate with a token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub email: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            created: Utc::now(),
        }
    }
}

impl MongoModel for User {
    fn collection_name() -> &'static str {
        "users"
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
            FieldDescriptor::required("email", FieldType::Str),
            FieldDescriptor::with_default("created", FieldType::DateTime, Value::Null),
        ]
    }
}

/// An opaque API token bound to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub key: String,
    pub user_id: Option<i64>,
    #[serde(
        default,
        with = "bson_datetime_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
}

impl Token {
    /// Create an active token with a freshly generated key and no expiry
    pub fn new(user_id: i64) -> Self {
        Self {
            id: None,
            key: generate_token(),
            user_id: Some(user_id),
            expires: None,
            is_active: true,
            created: Utc::now(),
        }
    }

    pub fn with_expiry(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// TTL index on `expires` with a custom lifetime
    pub fn ttl_index(seconds: u64) -> IndexModel {
        IndexModel::builder()
            .keys(doc! {"expires": 1})
            .options(
                IndexOptions::builder()
                    .name("TokenIndex".to_string())
                    .expire_after(std::time::Duration::from_secs(seconds))
                    .build(),
            )
            .build()
    }
}

impl MongoModel for Token {
    fn collection_name() -> &'static str {
        "tokens"
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
            FieldDescriptor::with_default("key", FieldType::Str, Value::Null),
            FieldDescriptor::with_default("user_id", FieldType::Int, Value::Null),
            FieldDescriptor::with_default("expires", FieldType::DateTime, Value::Null),
            FieldDescriptor::with_default("is_active", FieldType::Bool, json!(true)),
            FieldDescriptor::with_default("created", FieldType::DateTime, Value::Null),
        ]
    }

    fn indexes() -> Vec<IndexModel> {
        vec![Self::ttl_index(DEFAULT_TOKEN_TTL_SECONDS)]
    }
}

/// `Option<chrono::DateTime<Utc>>` as an optional BSON datetime
mod bson_datetime_option {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&bson::DateTime::from_chrono(*dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<bson::DateTime>::deserialize(deserializer)?;
        Ok(value.map(|dt| dt.to_chrono()))
    }
}
