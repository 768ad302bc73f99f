//! Centralized API error handling for axum-contrib
//!
//! This module provides the library-wide error taxonomy with HTTP status code
//! mapping, application error codes, per-field error descriptors and JSON
//! error responses of the shape
//! `{"error_codes": [...], "message": "...", "fields": [...]}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

/// Description of an error in a single request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub name: String,
    pub message: String,
    pub error_code: u16,
}

impl FieldError {
    pub fn new(name: impl Into<String>, message: impl Into<String>, error_code: u16) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            error_code,
        }
    }
}

/// Payload carried by every [`ApiError`] variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Application-specific error codes (HTTP status when not customized)
    pub error_codes: Vec<u16>,
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl ErrorDetail {
    fn new(error_code: u16, message: impl Into<String>) -> Self {
        Self {
            error_codes: vec![error_code],
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

/// API error type with HTTP status code mapping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Bad request: {}", .0.message)]
    BadRequest(ErrorDetail),

    #[error("Unauthorized: {}", .0.message)]
    Unauthorized(ErrorDetail),

    #[error("Forbidden: {}", .0.message)]
    Forbidden(ErrorDetail),

    #[error("Not found: {}", .0.message)]
    NotFound(ErrorDetail),

    #[error("Internal server error: {}", .0.message)]
    Internal(ErrorDetail),
}

/// JSON error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_codes: Vec<u16>,
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl ApiError {
    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(ErrorDetail::new(400, message))
    }

    /// 401 Unauthorized
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(ErrorDetail::new(401, message))
    }

    /// 403 Forbidden
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(ErrorDetail::new(403, message))
    }

    /// 404 Not Found
    pub fn not_found() -> Self {
        ApiError::NotFound(ErrorDetail::new(404, "Not found."))
    }

    /// 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(ErrorDetail::new(500, message))
    }

    /// Replace the application error code (keeps the HTTP status)
    pub fn with_error_code(mut self, error_code: u16) -> Self {
        self.detail_mut().error_codes = vec![error_code];
        self
    }

    /// Attach per-field error descriptors.
    ///
    /// When fields are present, the response `error_codes` list is rebuilt
    /// from the field codes, mirroring how validation errors are reported.
    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        if !fields.is_empty() {
            let mut codes: Vec<u16> = Vec::new();
            for f in &fields {
                if !codes.contains(&f.error_code) {
                    codes.push(f.error_code);
                }
            }
            self.detail_mut().error_codes = codes;
        }
        self.detail_mut().fields = fields;
        self
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the payload shared by all variants
    pub fn detail(&self) -> &ErrorDetail {
        match self {
            ApiError::BadRequest(d)
            | ApiError::Unauthorized(d)
            | ApiError::Forbidden(d)
            | ApiError::NotFound(d)
            | ApiError::Internal(d) => d,
        }
    }

    fn detail_mut(&mut self) -> &mut ErrorDetail {
        match self {
            ApiError::BadRequest(d)
            | ApiError::Unauthorized(d)
            | ApiError::Forbidden(d)
            | ApiError::NotFound(d)
            | ApiError::Internal(d) => d,
        }
    }

    /// Build the JSON body for this error
    pub fn to_response_body(&self) -> ErrorResponse {
        let detail = self.detail();
        ErrorResponse {
            error_codes: detail.error_codes.clone(),
            message: ensure_sentence(&detail.message),
            fields: detail.fields.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response_body();

        if status.is_server_error() {
            tracing::error!(
                status = %status.as_u16(),
                message = %body.message,
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                status = %status.as_u16(),
                message = %body.message,
                "Request rejected"
            );
        }

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = Vec::new();
        let field_errors = errors.field_errors();
        // Sorted for a deterministic response body
        let mut names: Vec<&str> = field_errors.keys().copied().collect();
        names.sort_unstable();

        for name in names {
            // First error per field wins, later ones are dropped
            if let Some(err) = field_errors[name].first() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value: {}", err.code));
                fields.push(FieldError::new(
                    name,
                    ensure_sentence(&capitalize(&message)),
                    400,
                ));
            }
        }

        ApiError::bad_request("Validation error.").with_fields(fields)
    }
}

/// Append a final `.` unless the message already ends in `.`, `?` or `!`
pub(crate) fn ensure_sentence(message: &str) -> String {
    if message.is_empty() || message.ends_with(['.', '?', '!']) {
        message.to_string()
    } else {
        format!("{}.", message)
    }
}

/// Uppercase the first character of a message
pub(crate) fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::unauthorized("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_default_error_codes_match_status() {
        assert_eq!(ApiError::not_found().detail().error_codes, vec![404]);
        assert_eq!(ApiError::bad_request("x").detail().error_codes, vec![400]);
    }

    #[test]
    fn test_custom_error_code() {
        let err = ApiError::bad_request("No such flavor.").with_error_code(4212);
        assert_eq!(err.detail().error_codes, vec![4212]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_fields_rebuild_error_codes() {
        let err = ApiError::bad_request("Validation error.").with_fields(vec![
            FieldError::new("a", "Broken.", 1001),
            FieldError::new("b", "Also broken.", 1002),
            FieldError::new("c", "Broken the same way.", 1001),
        ]);
        assert_eq!(err.detail().error_codes, vec![1001, 1002]);
        assert_eq!(err.detail().fields.len(), 3);
    }

    #[test]
    fn test_message_punctuation() {
        assert_eq!(ensure_sentence("Not found"), "Not found.");
        assert_eq!(ensure_sentence("Not found."), "Not found.");
        assert_eq!(ensure_sentence("Are you sure?"), "Are you sure?");
        assert_eq!(ensure_sentence("No!"), "No!");
        assert_eq!(ensure_sentence(""), "");
    }

    #[test]
    fn test_response_body_normalizes_message() {
        let body = ApiError::bad_request("bad input").to_response_body();
        assert_eq!(body.message, "bad input.");
        assert_eq!(body.error_codes, vec![400]);
        assert!(body.fields.is_empty());
    }

    #[derive(Validate)]
    struct SignupRequest {
        #[validate(email(message = "not a valid email address"))]
        email: String,

        #[validate(length(min = 3, message = "too short"))]
        name: String,
    }

    #[test]
    fn test_from_validation_errors() {
        let request = SignupRequest {
            email: "nope".to_string(),
            name: "ab".to_string(),
        };
        let err: ApiError = request.validate().unwrap_err().into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let detail = err.detail();
        assert_eq!(detail.fields.len(), 2);
        // Fields are sorted by name
        assert_eq!(detail.fields[0].name, "email");
        assert_eq!(detail.fields[0].message, "Not a valid email address.");
        assert_eq!(detail.fields[0].error_code, 400);
        assert_eq!(detail.fields[1].name, "name");
        assert_eq!(detail.fields[1].message, "Too short.");
        assert_eq!(detail.error_codes, vec![400]);
    }
}
