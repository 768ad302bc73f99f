//! Model trait for MongoDB-backed entities
//!
//! A model is a plain serde struct whose integer id maps to the document
//! `_id`. The declared field table feeds serializer schema synthesis; it is
//! never derived by reflection, the model states it explicitly.

use mongodb::IndexModel;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::IdBits;
use crate::serializers::FieldDescriptor;

/// A storage entity living in a MongoDB collection
pub trait MongoModel: Serialize + DeserializeOwned + Send + Sync + Unpin {
    /// Name of the backing collection
    fn collection_name() -> &'static str;

    /// Document id, `None` until the model has been inserted
    fn id(&self) -> Option<i64>;

    /// Assign the document id (called on insert)
    fn set_id(&mut self, id: i64);

    /// Declared field table, seeds serializer schema synthesis
    fn field_descriptors() -> Vec<FieldDescriptor>;

    /// Indexes created by [`crate::db::MongoClient::create_indexes`]
    fn indexes() -> Vec<IndexModel> {
        Vec::new()
    }
}

/// Generate a random positive document id of the configured width
pub fn generate_id(bits: IdBits) -> i64 {
    let mut rng = rand::thread_rng();
    match bits {
        IdBits::ThirtyTwo => i64::from(rng.gen::<u32>()),
        // Top bit cleared so the id stays a positive BSON int64
        IdBits::SixtyFour => (rng.gen::<u64>() >> 1) as i64,
    }
}
