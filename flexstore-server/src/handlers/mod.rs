//! Request handlers, grouped by resource.

pub mod collections;
pub mod documents;
pub mod health;
pub mod protected;

use crate::error::ApiError;

/// Answers unknown routes with the error envelope.
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
