use axum::extract::State;
use serde::Serialize;

use crate::{
    response::ApiResponse,
    state::{AppState, VERSION},
};

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: String,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> ApiResponse<Health> {
    ApiResponse::ok(Health {
        status: "ok",
        version: VERSION,
        uptime: state.uptime(),
    })
}
