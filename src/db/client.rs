//! MongoDB client wrapper
//!
//! Thin convenience layer over `mongodb::Database`: pool sizing from
//! [`Settings`], `id` ⇄ `_id` mapping, raw-document listing for pagination
//! and per-operation duration logging at debug level.

use std::time::Instant;

use futures_util::TryStreamExt;
use mongodb::bson::{self, Bson, Document};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::results::UpdateResult;
use mongodb::{Client, Collection};
use thiserror::Error;

use crate::config::{IdBits, Settings};
use crate::db::model::{generate_id, MongoModel};

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Database operation failed: {0}")]
    Operation(#[from] mongodb::error::Error),

    #[error("Failed to serialize model to BSON: {0}")]
    Serialize(#[from] bson::ser::Error),

    #[error("Failed to deserialize model from BSON: {0}")]
    Deserialize(#[from] bson::de::Error),
}

/// Handle to the application database
#[derive(Clone)]
pub struct MongoClient {
    database: mongodb::Database,
    id_bits: IdBits,
}

impl MongoClient {
    /// Connect using the library settings
    pub async fn connect(settings: &Settings) -> Result<Self, DbError> {
        tracing::info!(
            dsn = %settings.mongodb_dsn_masked(),
            database = %settings.mongodb_dbname,
            "Connecting to MongoDB"
        );

        let mut options = ClientOptions::parse(&settings.mongodb_dsn)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;
        options.min_pool_size = Some(settings.mongodb_min_pool_size);
        options.max_pool_size = Some(settings.mongodb_max_pool_size);

        let client = Client::with_options(options).map_err(|e| DbError::Connection(e.to_string()))?;
        let database = client.database(&settings.mongodb_dbname);

        Ok(Self {
            database,
            id_bits: settings.id_bits,
        })
    }

    /// Wrap an already-connected database (useful in tests)
    pub fn from_database(database: mongodb::Database, id_bits: IdBits) -> Self {
        Self { database, id_bits }
    }

    pub fn database(&self) -> &mongodb::Database {
        &self.database
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }

    /// Check database connectivity (for health checks)
    pub async fn is_healthy(&self) -> bool {
        self.database
            .run_command(bson::doc! {"ping": 1}, None)
            .await
            .is_ok()
    }

    /// Fetch one model matching `filter` (`id` keys are mapped to `_id`)
    pub async fn get<M: MongoModel>(&self, filter: Document) -> Result<Option<M>, DbError> {
        let started = Instant::now();
        let filter = normalize_id_filter(filter);
        let document = self
            .collection(M::collection_name())
            .find_one(filter, None)
            .await?;
        log_op(M::collection_name(), "get", started);

        document
            .map(|d| bson::from_document::<M>(d).map_err(DbError::from))
            .transpose()
    }

    /// Count documents matching `filter`
    pub async fn count<M: MongoModel>(&self, filter: Document) -> Result<u64, DbError> {
        self.count_documents(M::collection_name(), filter).await
    }

    /// Delete every document matching `filter`, returning the deleted count
    pub async fn delete<M: MongoModel>(&self, filter: Document) -> Result<u64, DbError> {
        let started = Instant::now();
        let filter = normalize_id_filter(filter);
        let result = self
            .collection(M::collection_name())
            .delete_many(filter, None)
            .await?;
        log_op(M::collection_name(), "delete", started);
        Ok(result.deleted_count)
    }

    /// List raw documents for a model (`_id` remapped to `id`)
    pub async fn list<M: MongoModel>(
        &self,
        filter: Document,
        limit: u64,
        offset: u64,
        sort: Option<Document>,
    ) -> Result<Vec<Document>, DbError> {
        self.find_documents(M::collection_name(), filter, limit, offset, sort)
            .await
    }

    /// Insert a model, generating its id when unset
    pub async fn insert<M: MongoModel>(&self, model: &mut M) -> Result<(), DbError> {
        let started = Instant::now();
        if model.id().is_none() {
            model.set_id(generate_id(self.id_bits));
        }
        let document = bson::to_document(model)?;
        self.collection(M::collection_name())
            .insert_one(document, None)
            .await?;
        log_op(M::collection_name(), "insert", started);
        Ok(())
    }

    /// Apply `update` to the first document matching `filter`
    pub async fn update_one<M: MongoModel>(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, DbError> {
        self.update_one_raw(M::collection_name(), filter, update).await
    }

    /// Apply `update` to every document matching `filter`
    pub async fn update_many<M: MongoModel>(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, DbError> {
        self.update_many_raw(M::collection_name(), filter, update)
            .await
    }

    /// Create the model's declared indexes, returning their names
    pub async fn create_indexes<M: MongoModel>(&self) -> Result<Vec<String>, DbError> {
        let indexes = M::indexes();
        if indexes.is_empty() {
            return Ok(Vec::new());
        }
        let started = Instant::now();
        let result = self
            .collection(M::collection_name())
            .create_indexes(indexes, None)
            .await?;
        log_op(M::collection_name(), "create_indexes", started);
        Ok(result.index_names)
    }

    // Raw-document operations, used by pagination and the serializer
    // persistence proxies.

    pub async fn count_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<u64, DbError> {
        let started = Instant::now();
        let filter = normalize_id_filter(filter);
        let count = self
            .collection(collection)
            .count_documents(filter, None)
            .await?;
        log_op(collection, "count", started);
        Ok(count)
    }

    /// Find raw documents, remapping `_id` to `id` in each result
    pub async fn find_documents(
        &self,
        collection: &str,
        filter: Document,
        limit: u64,
        offset: u64,
        sort: Option<Document>,
    ) -> Result<Vec<Document>, DbError> {
        let started = Instant::now();
        let filter = normalize_id_filter(filter);
        let options = FindOptions::builder()
            .skip(offset)
            .limit(limit as i64)
            .sort(sort)
            .build();

        let cursor = self.collection(collection).find(filter, options).await?;
        let mut documents: Vec<Document> = cursor.try_collect().await?;
        for document in &mut documents {
            if let Some(id) = document.remove("_id") {
                document.insert("id", id);
            }
        }
        log_op(collection, "list", started);
        Ok(documents)
    }

    /// Insert a raw document, generating its `_id` when unset
    pub async fn insert_document(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<i64, DbError> {
        let started = Instant::now();
        if let Some(id) = document.remove("id") {
            document.insert("_id", id);
        }
        if !document.contains_key("_id") {
            document.insert("_id", Bson::Int64(generate_id(self.id_bits)));
        }
        let result = self
            .collection(collection)
            .insert_one(&document, None)
            .await?;
        log_op(collection, "insert", started);

        match result.inserted_id {
            Bson::Int64(id) => Ok(id),
            Bson::Int32(id) => Ok(i64::from(id)),
            other => Err(DbError::Connection(format!(
                "unexpected inserted id type: {:?}",
                other
            ))),
        }
    }

    pub async fn update_one_raw(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, DbError> {
        let started = Instant::now();
        let filter = normalize_id_filter(filter);
        let result = self
            .collection(collection)
            .update_one(filter, update, None)
            .await?;
        log_op(collection, "update_one", started);
        Ok(result)
    }

    pub async fn update_many_raw(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, DbError> {
        let started = Instant::now();
        let filter = normalize_id_filter(filter);
        let result = self
            .collection(collection)
            .update_many(filter, update, None)
            .await?;
        log_op(collection, "update_many", started);
        Ok(result)
    }
}

/// Move an `id` filter key to `_id`
fn normalize_id_filter(mut filter: Document) -> Document {
    if let Some(id) = filter.remove("id") {
        filter.insert("_id", id);
    }
    filter
}

fn log_op(collection: &str, op: &str, started: Instant) {
    tracing::debug!(
        collection,
        op,
        duration_ms = started.elapsed().as_millis() as u64,
        "DB operation"
    );
}
