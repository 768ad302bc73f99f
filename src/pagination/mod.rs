//! Offset/limit pagination over MongoDB collections
//!
//! [`Pagination`] parses and validates `offset`/`limit` query parameters and
//! remembers the request URI so it can build `next`/`previous` links.
//! [`Pagination::paginate`] runs the count and the page fetch concurrently
//! and sanitizes rows through the serializer's exclude set.
//!
//! ```rust,ignore
//! async fn list_notes(
//!     pagination: Pagination,
//!     State(state): State<AppState>,
//! ) -> Result<Json<Page>, ApiError> {
//!     let page = pagination
//!         .paginate(&state.mongo, &state.note_schema, doc! {})
//!         .await?;
//!     Ok(Json(page))
//! }
//! ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

use crate::db::MongoClient;
use crate::error::{ApiError, FieldError};
use crate::serializers::SynthesizedSchema;

pub const DEFAULT_OFFSET: u64 = 0;
pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 1000;

#[derive(Debug, Deserialize)]
struct PaginationParams {
    offset: Option<i64>,
    limit: Option<i64>,
}

/// One page of results
#[derive(Debug, Serialize)]
pub struct Page {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub result: Vec<Document>,
}

/// Query params parser and collection paginator in one
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
    path: String,
    query_pairs: Vec<(String, String)>,
}

impl Pagination {
    /// Build a paginator directly (the extractor does this from the URI)
    pub fn new(offset: u64, limit: u64, path: impl Into<String>, query: &str) -> Self {
        Self {
            offset,
            limit,
            path: path.into(),
            query_pairs: parse_query(query),
        }
    }

    /// Fetch one page: concurrent count + list, rows sanitized through the
    /// serializer's exclude set.
    pub async fn paginate(
        &self,
        client: &MongoClient,
        schema: &SynthesizedSchema,
        filter: Document,
    ) -> Result<Page, ApiError> {
        self.paginate_sorted(client, schema, filter, None).await
    }

    /// Like [`Self::paginate`] with an explicit sort document
    pub async fn paginate_sorted(
        &self,
        client: &MongoClient,
        schema: &SynthesizedSchema,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Page, ApiError> {
        let binding = schema
            .model()
            .ok_or_else(|| ApiError::internal("Serializer has no backing model bound."))?;

        let (count, rows) = tokio::join!(
            client.count_documents(&binding.collection, filter.clone()),
            client.find_documents(&binding.collection, filter, self.limit, self.offset, sort),
        );
        let count = count?;
        let result = schema.sanitize_list(rows?);

        Ok(Page {
            count,
            next: self.next_url(count),
            previous: self.previous_url(),
            result,
        })
    }

    /// URL of the next page, `None` on the last page
    pub fn next_url(&self, count: u64) -> Option<String> {
        if self.offset + self.limit >= count {
            return None;
        }
        let mut pairs = self.query_pairs.clone();
        set_param(&mut pairs, "limit", self.limit.to_string());
        set_param(&mut pairs, "offset", (self.offset + self.limit).to_string());
        Some(build_url(&self.path, &pairs))
    }

    /// URL of the previous page, `None` on the first page.
    ///
    /// When stepping back lands at the start, the `offset` parameter is
    /// dropped instead of being set to zero.
    pub fn previous_url(&self) -> Option<String> {
        if self.offset == 0 {
            return None;
        }
        let mut pairs = self.query_pairs.clone();
        if self.offset <= self.limit {
            remove_param(&mut pairs, "offset");
        } else {
            set_param(&mut pairs, "limit", self.limit.to_string());
            set_param(&mut pairs, "offset", (self.offset - self.limit).to_string());
        }
        Some(build_url(&self.path, &pairs))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Pagination {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("Invalid pagination parameters."))?;

        let mut fields: Vec<FieldError> = Vec::new();

        let offset = params.offset.unwrap_or(DEFAULT_OFFSET as i64);
        if offset < 0 {
            fields.push(FieldError::new(
                "offset",
                "Value must be greater than or equal to 0.",
                400,
            ));
        }

        let limit = params.limit.unwrap_or(DEFAULT_LIMIT as i64);
        if limit < 1 {
            fields.push(FieldError::new(
                "limit",
                "Value must be greater than or equal to 1.",
                400,
            ));
        } else if limit > MAX_LIMIT as i64 {
            fields.push(FieldError::new(
                "limit",
                format!("Value must be less than or equal to {}.", MAX_LIMIT),
                400,
            ));
        }

        if !fields.is_empty() {
            return Err(ApiError::bad_request("Validation error.").with_fields(fields));
        }

        Ok(Pagination::new(
            offset as u64,
            limit as u64,
            parts.uri.path(),
            parts.uri.query().unwrap_or(""),
        ))
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn set_param(pairs: &mut Vec<(String, String)>, key: &str, value: String) {
    if let Some(entry) = pairs.iter_mut().find(|(k, _)| k == key) {
        entry.1 = value;
    } else {
        pairs.push((key.to_string(), value));
    }
}

fn remove_param(pairs: &mut Vec<(String, String)>, key: &str) {
    pairs.retain(|(k, _)| k != key);
}

fn build_url(path: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let query: Vec<String> = pairs
        .iter()
        .map(|(key, value)| {
            if value.is_empty() {
                key.clone()
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect();
    format!("{}?{}", path, query.join("&"))
}
