//! MongoDB integration for axum-contrib
//!
//! A thin wrapper over the async MongoDB driver plus the [`MongoModel`] trait
//! for active-record-style entities keyed by generated integer ids.

mod client;
mod model;

pub use client::{DbError, MongoClient};
pub use model::{generate_id, MongoModel};

use crate::error::ApiError;

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::internal(err.to_string())
    }
}
