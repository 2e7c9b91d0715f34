use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    response::ApiResponse,
    state::{AppState, VERSION},
};

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub message: &'static str,
    pub server_time: DateTime<Utc>,
    pub version: &'static str,
    pub uptime: String,
}

/// `GET /api/protected/info`, behind Basic Auth when it is enabled.
pub async fn info(State(state): State<AppState>) -> ApiResponse<ServerInfo> {
    ApiResponse::ok(ServerInfo {
        message: "This is a protected endpoint that requires authentication",
        server_time: Utc::now(),
        version: VERSION,
        uptime: state.uptime(),
    })
}
