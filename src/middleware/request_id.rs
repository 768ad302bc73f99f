//! Request-id middleware

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::config::Settings;

/// Request id attached to every request's extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Middleware that propagates the request id.
///
/// Reads the configured header, generates a UUIDv4 when absent, stores a
/// [`RequestId`] extension for handlers and echoes the header on the
/// response.
///
/// ```rust,ignore
/// let app = Router::new()
///     .layer(middleware::from_fn_with_state(settings.clone(), request_id));
/// ```
pub async fn request_id(
    State(settings): State<Settings>,
    mut request: Request,
    next: Next,
) -> Response {
    let id = request
        .headers()
        .get(&settings.request_id_header)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;

    if let (Ok(name), Ok(value)) = (
        HeaderName::from_bytes(settings.request_id_header.as_bytes()),
        HeaderValue::from_str(&id),
    ) {
        response.headers_mut().insert(name, value);
    }

    response
}
