use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use shoplist_backends::SharedBackend;
use shoplist_core::BackendError;

#[derive(Clone)]
pub struct HealthState {
    pub backend: SharedBackend,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub backend: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let backend = backend_check(&state).await;
    let ready = backend.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "shoplist-server runtime initialized".to_string(),
        },
        backend,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn backend_check(state: &HealthState) -> HealthCheck {
    let name = state.backend.name();
    let outcome = match tokio::time::timeout(state.timeout, state.backend.list()).await {
        Ok(result) => result,
        Err(_elapsed) => Err(BackendError::Timeout(state.timeout)),
    };

    match outcome {
        Ok(items) => HealthCheck {
            status: "ready",
            detail: format!("{name} backend listed {} item(s)", items.len()),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("{name} backend check failed: {}", error.into_interface("health")),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::{extract::State, Json};
    use shoplist_backends::InMemoryListBackend;
    use shoplist_core::{BackendError, Item, ListBackend};
    use tower::ServiceExt;

    use crate::health::{health, router, HealthState};

    struct StalledBackend;

    #[async_trait]
    impl ListBackend for StalledBackend {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn create(&self, _name: &str) -> Result<(), BackendError> {
            std::future::pending().await
        }

        async fn list(&self) -> Result<Vec<Item>, BackendError> {
            std::future::pending().await
        }

        async fn clear(&self) -> Result<(), BackendError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn health_returns_ready_when_backend_lists() {
        let state = HealthState {
            backend: Arc::new(InMemoryListBackend::with_items(["Milk"])),
            timeout: Duration::from_secs(1),
        };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.backend.status, "ready");
        assert_eq!(payload.backend.detail, "memory backend listed 1 item(s)");
    }

    #[tokio::test(start_paused = true)]
    async fn health_returns_service_unavailable_when_backend_stalls() {
        let state =
            HealthState { backend: Arc::new(StalledBackend), timeout: Duration::from_secs(2) };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.service.status, "ready");
        assert!(payload.backend.detail.contains("timed out after 2000ms"));
    }

    #[tokio::test]
    async fn health_route_is_served_over_http() {
        let app = router(HealthState {
            backend: Arc::new(InMemoryListBackend::default()),
            timeout: Duration::from_secs(1),
        });

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], "ready");
    }
}
