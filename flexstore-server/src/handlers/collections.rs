//! `/api/collections` handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use flexstore::collection::Collection;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    error::ApiError,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateCollection {
    #[serde(default)]
    pub name: String,
}

/// `GET /api/collections`
pub async fn list(State(state): State<AppState>) -> Result<ApiResponse<Vec<Collection>>, ApiError> {
    let list = state.store.collections().list().await?;

    Ok(ApiResponse::ok(list.collections).with_meta(Meta::total(list.total)))
}

/// `POST /api/collections`
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateCollection>, JsonRejection>,
) -> Result<ApiResponse<Collection>, ApiError> {
    let Json(request) = body?;
    let collection = state.store.collections().create(&request.name).await?;
    info!(collection = %collection.name, "collection created");

    Ok(ApiResponse::created(collection))
}

/// `GET /api/collections/{name}`
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<ApiResponse<Collection>, ApiError> {
    let collection = state.store.collections().get(&name).await?;

    Ok(ApiResponse::ok(collection))
}

/// `DELETE /api/collections/{name}`
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    state.store.collections().delete(&name).await?;
    info!(collection = %name, "collection deleted");

    Ok(ApiResponse::ok(json!({"message": "Collection deleted successfully"})))
}
