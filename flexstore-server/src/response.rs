//! The JSON envelope every endpoint answers with.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Machine-readable code plus a human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Paging information attached to list responses.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl Meta {
    pub fn total(total: usize) -> Self {
        Self {
            total: Some(total),
            ..Self::default()
        }
    }

    pub fn page(total: usize, limit: usize, offset: usize) -> Self {
        Self {
            total: Some(total),
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope<()> {
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
            meta: None,
        }
    }
}

/// A successful response: status code plus enveloped data.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    envelope: Envelope<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            status,
            envelope: Envelope {
                status: Status::Success,
                data: Some(data),
                error: None,
                meta: None,
            },
        }
    }

    /// 200 OK.
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, data)
    }

    /// 201 Created.
    pub fn created(data: T) -> Self {
        Self::new(StatusCode::CREATED, data)
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.envelope.meta = Some(meta);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_omits_error() {
        let envelope = ApiResponse::ok(json!({"id": "a"}))
            .with_meta(Meta::total(1))
            .envelope;

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": "success", "data": {"id": "a"}, "meta": {"total": 1}})
        );
    }

    #[test]
    fn error_envelope_omits_data() {
        let envelope = Envelope::error("NOT_FOUND", "gone");

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": "error", "error": {"code": "NOT_FOUND", "message": "gone"}})
        );
    }
}
