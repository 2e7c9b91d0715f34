//! Mapping store failures and request rejections onto HTTP responses.

use std::any::Any;

use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flexstore::error::DocumentStoreError;
use tracing::error;

use crate::response::Envelope;

/// An error response: status code, error code and message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Authentication required")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An unexpected error occurred",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(Envelope::error(self.code, self.message))).into_response()
    }
}

impl From<DocumentStoreError> for ApiError {
    fn from(err: DocumentStoreError) -> Self {
        use DocumentStoreError::*;

        let message = err.to_string();
        match err {
            CollectionNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "COLLECTION_NOT_FOUND", message)
            }
            DocumentNotFound(..) => Self::new(StatusCode::NOT_FOUND, "DOCUMENT_NOT_FOUND", message),
            CollectionAlreadyExists(_) => {
                Self::new(StatusCode::CONFLICT, "COLLECTION_EXISTS", message)
            }
            DocumentAlreadyExists(..) => {
                Self::new(StatusCode::CONFLICT, "DOCUMENT_EXISTS", message)
            }
            InvalidCollectionName(_) => Self::bad_request("INVALID_NAME", message),
            InvalidPayload(_) => Self::bad_request("INVALID_JSON", message),
            Storage(_) | Initialization(_) => {
                error!(error = %message, "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::UNSUPPORTED_MEDIA_TYPE => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, "INVALID_JSON", rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, "INVALID_FORM", err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::bad_request("INVALID_FORM", rejection.body_text())
    }
}

/// Turns a handler panic into the generic 500 envelope.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "request handler panicked");

    ApiError::internal().into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_status_codes() {
        let cases = [
            (DocumentStoreError::CollectionNotFound("c".into()), StatusCode::NOT_FOUND),
            (
                DocumentStoreError::DocumentNotFound("d".into(), "c".into()),
                StatusCode::NOT_FOUND,
            ),
            (DocumentStoreError::CollectionAlreadyExists("c".into()), StatusCode::CONFLICT),
            (
                DocumentStoreError::DocumentAlreadyExists("d".into(), "c".into()),
                StatusCode::CONFLICT,
            ),
            (DocumentStoreError::InvalidCollectionName("empty".into()), StatusCode::BAD_REQUEST),
            (DocumentStoreError::InvalidPayload("bad".into()), StatusCode::BAD_REQUEST),
            (DocumentStoreError::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn panics_become_internal_errors() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_panic(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
