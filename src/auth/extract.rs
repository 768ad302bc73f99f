//! Authentication extractors
//!
//! Handlers ask for [`AuthenticatedUser`] to require a valid
//! `Authorization: Token <key>` header, or [`OptionalUser`] to observe the
//! authenticated user when present without rejecting anonymous requests.
//! Requiring `AuthenticatedUser` is the authorization check itself; custom
//! permission rules are further extractors built the same way.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn whoami(user: AuthenticatedUser) -> Json<User> {
//!     Json(user.user)
//! }
//! ```

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::Utc;
use mongodb::bson::{self, doc};

use crate::auth::models::{Token, User};
use crate::db::MongoClient;
use crate::error::ApiError;

/// The user and token behind a valid `Authorization: Token <key>` header
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: Token,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    MongoClient: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let key = token_key_from_headers(&parts.headers)?;
        let client = MongoClient::from_ref(state);

        let now = bson::DateTime::from_chrono(Utc::now());
        let token: Token = client
            .get(doc! {
                "key": &key,
                "is_active": true,
                // Matches tokens with no expiry as well
                "expires": {"$not": {"$lt": now}},
            })
            .await?
            .ok_or_else(|| ApiError::unauthorized("Not authenticated."))?;

        let user_id = token
            .user_id
            .ok_or_else(|| ApiError::unauthorized("Not authenticated."))?;
        let user: User = client
            .get(doc! {"id": user_id})
            .await?
            .ok_or_else(|| ApiError::unauthorized("Not authenticated."))?;

        Ok(Self { user, token })
    }
}

/// Authenticated user when the request carries a valid token, `None` otherwise
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    MongoClient: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(
            AuthenticatedUser::from_request_parts(parts, state)
                .await
                .ok(),
        ))
    }
}

/// Extract the token key from the `Authorization` header.
///
/// The scheme must be `Token`, compared case-insensitively.
pub(crate) fn token_key_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Not authenticated."))?;
    let header = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid authentication credentials."))?;

    let mut split = header.splitn(2, ' ');
    let scheme = split.next().unwrap_or("");
    let credentials = split.next().unwrap_or("").trim();

    if scheme.is_empty() || credentials.is_empty() {
        return Err(ApiError::unauthorized("Not authenticated."));
    }
    if !scheme.eq_ignore_ascii_case("token") {
        return Err(ApiError::unauthorized(
            "Invalid authentication credentials.",
        ));
    }

    Ok(credentials.to_string())
}
