//! Document handlers: CRUD, listing, bulk loading and file upload.
//!
//! Request bodies reach the store as raw bytes so payloads are stored exactly as
//! they were sent.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection},
};
use flexstore::{document::Document, query::DocumentQuery};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json, value::RawValue};
use tracing::info;

use crate::{
    error::ApiError,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Multipart field carrying an upload.
pub const UPLOAD_FIELD: &str = "file";

/// Raw listing parameters. Values that do not parse fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub filter: Option<String>,
    pub sort: Option<String>,
}

impl ListParams {
    pub fn to_query(&self) -> DocumentQuery {
        let mut builder = DocumentQuery::builder();
        if let Some(limit) = self.limit.as_deref().and_then(|v| v.trim().parse::<i64>().ok()) {
            builder = builder.limit(limit);
        }
        if let Some(offset) = self.offset.as_deref().and_then(|v| v.trim().parse::<i64>().ok()) {
            builder = builder.offset(offset);
        }
        if let Some(filter) = &self.filter {
            builder = builder.filter(filter.as_str());
        }
        if let Some(sort) = &self.sort {
            builder = builder.sort(sort.as_str());
        }

        builder.build()
    }
}

/// Response of the bulk and upload endpoints.
#[derive(Debug, Serialize)]
pub struct BulkCreated {
    pub message: &'static str,
    pub count: usize,
    pub documents: Vec<Document>,
}

impl BulkCreated {
    fn new(message: &'static str, documents: Vec<Document>) -> Self {
        Self {
            message,
            count: documents.len(),
            documents,
        }
    }
}

/// `GET /api/collections/{name}/documents`
pub async fn list(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<ApiResponse<Vec<Document>>, ApiError> {
    let query = params.to_query();
    let page = state.store.documents(&name).list(&query).await?;
    let meta = Meta::page(page.total, page.limit, page.offset);

    Ok(ApiResponse::ok(page.documents).with_meta(meta))
}

/// `POST /api/collections/{name}/documents`
pub async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<Document>, ApiError> {
    let document = state.store.documents(&name).create(&body).await?;

    Ok(ApiResponse::created(document))
}

/// `POST /api/collections/{name}/documents/{id}`
pub async fn create_with_id(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<ApiResponse<Document>, ApiError> {
    let document = state.store.documents(&name).create_with_id(&id, &body).await?;

    Ok(ApiResponse::created(document))
}

/// `GET /api/collections/{name}/documents/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<ApiResponse<Document>, ApiError> {
    let document = state.store.documents(&name).get(&id).await?;

    Ok(ApiResponse::ok(document))
}

/// `PUT /api/collections/{name}/documents/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<ApiResponse<Document>, ApiError> {
    let document = state.store.documents(&name).update(&id, &body).await?;

    Ok(ApiResponse::ok(document))
}

/// `DELETE /api/collections/{name}/documents/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<ApiResponse<Value>, ApiError> {
    state.store.documents(&name).delete(&id).await?;

    Ok(ApiResponse::ok(json!({"message": "Document deleted successfully"})))
}

/// `POST /api/collections/{name}/bulk` with a JSON array body.
pub async fn bulk_create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<BulkCreated>, ApiError> {
    let items: Vec<Box<RawValue>> = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request("INVALID_JSON", format!("Invalid JSON array: {e}")))?;

    let documents = state
        .store
        .documents(&name)
        .bulk_create(items.iter().map(|item| item.get()).collect::<Vec<_>>())
        .await?;
    info!(collection = %name, count = documents.len(), "bulk created documents");

    Ok(ApiResponse::created(BulkCreated::new(
        "Documents created successfully",
        documents,
    )))
}

/// `POST /api/upload/{name}` with the upload in the multipart field `file`.
///
/// A JSON array becomes one document per element, a JSON object becomes a single
/// document.
pub async fn upload(
    State(state): State<AppState>,
    Path(name): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<BulkCreated>, ApiError> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            upload = Some(field.bytes().await?);
            break;
        }
    }
    let upload = upload
        .ok_or_else(|| ApiError::bad_request("INVALID_FILE", "Could not get file from form"))?;

    let documents = state.store.documents(&name).import(&upload).await?;
    info!(collection = %name, count = documents.len(), bytes = upload.len(), "processed upload");

    Ok(ApiResponse::created(BulkCreated::new(
        "File processed successfully",
        documents,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexstore::query::{DEFAULT_LIMIT, DEFAULT_OFFSET};

    fn params(limit: Option<&str>, offset: Option<&str>) -> ListParams {
        ListParams {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
            ..ListParams::default()
        }
    }

    #[test]
    fn valid_window_is_used() {
        let query = params(Some("10"), Some("20")).to_query();
        assert_eq!((query.limit, query.offset), (10, 20));
    }

    #[test]
    fn unusable_values_fall_back_to_defaults() {
        for (limit, offset) in [
            (Some("0"), Some("-1")),
            (Some("-5"), Some("abc")),
            (Some("ten"), None),
            (None, None),
        ] {
            let query = params(limit, offset).to_query();
            assert_eq!(query.limit, DEFAULT_LIMIT);
            assert_eq!(query.offset, DEFAULT_OFFSET);
        }
    }

    #[test]
    fn filter_and_sort_are_carried_through() {
        let query = ListParams {
            filter: Some("age>3".into()),
            sort: Some("name".into()),
            ..ListParams::default()
        }
        .to_query();

        assert_eq!(query.filter.as_deref(), Some("age>3"));
        assert_eq!(query.sort.as_deref(), Some("name"));
    }
}
