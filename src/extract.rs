//! Request body extraction tied into the error taxonomy
//!
//! [`ValidatedJson`] replaces `axum::Json` for request bodies: it rejects
//! empty bodies with a dedicated message, and reports deserialization and
//! `validator` failures as the library's standard JSON error shape.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON body, deserialized and validated
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::bad_request("Unable to read request body."))?;

        if bytes.is_empty() {
            return Err(ApiError::bad_request(
                "Empty body for this request is not valid.",
            ));
        }

        let value: T = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::bad_request(format!("Malformed JSON body: {}", e)))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}
