//! Token authentication for axum-contrib
//!
//! Opaque DB-backed tokens: a [`Token`] document holds a generated 128-hex
//! key bound to a [`User`]; the [`AuthenticatedUser`] extractor resolves the
//! `Authorization: Token <key>` header against the `tokens` collection.

mod extract;
mod models;
mod token;

pub use extract::{AuthenticatedUser, OptionalUser};
pub use models::{Token, User, DEFAULT_TOKEN_TTL_SECONDS};
pub use token::generate_token;

use crate::serializers::{Serializer, SerializerMeta};

/// Serializer declaration for issuing tokens over the API.
///
/// `user_id` is excluded on both sides; the server assigns it.
pub fn token_serializer() -> Serializer {
    Serializer::new("TokenSerializer").meta(
        SerializerMeta::new()
            .model::<Token>()
            .exclude("user_id"),
    )
}
