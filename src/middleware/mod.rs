//! Middleware for axum-contrib applications
//!
//! Request-id propagation and request tracing. Authentication lives in
//! [`crate::auth`] as extractors.

mod request_id;
mod tracing;

pub use self::request_id::{request_id, RequestId};
pub use self::tracing::request_tracing;
