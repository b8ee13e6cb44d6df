/// Health reporter request handlers

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::core::HealthStatus;

/// Shared by every request; only the service identifier is fixed per process
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: String,
}

/// `/health` matches the full request target, so a query string is a miss
pub async fn health_check(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    if uri.query().is_some() {
        return StatusCode::NOT_FOUND.into_response();
    }

    Json(HealthStatus::now(state.service.clone())).into_response()
}

/// Anything that is not `/health`
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
