/// Health reporter routes

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};
use crate::utils::HEALTH_PATH;

pub fn create_router(service: impl Into<String>) -> Router {
    let state = Arc::new(AppState {
        service: service.into(),
    });

    Router::new()
        .route(HEALTH_PATH, get(handlers::health_check))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::core::{HealthState, HealthStatus};

    async fn get_path(path: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = create_router("test-bot")
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn test_health_returns_status_json() {
        let before = chrono::Utc::now().timestamp();
        let (status, content_type, body) = get_path("/health").await;
        let after = chrono::Utc::now().timestamp();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));

        let health: HealthStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, HealthState::Healthy);
        assert_eq!(health.service, "test-bot");
        assert!(health.timestamp >= before && health.timestamp <= after);
    }

    #[tokio::test]
    async fn test_other_paths_are_not_found() {
        for path in [
            "/",
            "/healthz",
            "/health/extra",
            "/api/health",
            "/metrics?x=1",
            "/health?x=1",
            "/health?",
        ] {
            let (status, _, body) = get_path(path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "path {}", path);
            assert!(body.is_empty(), "path {}", path);
        }
    }
}
