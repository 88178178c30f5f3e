use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use kunan_core::config::{IntegrationStatus, StorageBackend};

#[derive(Clone)]
pub struct HealthState {
    integrations: IntegrationStatus,
    storage_backend: StorageBackend,
}

impl HealthState {
    pub fn new(integrations: IntegrationStatus, storage_backend: StorageBackend) -> Self {
        Self { integrations, storage_backend }
    }
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
    pub completion: HealthCheck,
    pub storage: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let ready = state.integrations.all_configured();

    let completion = if state.integrations.completion_configured {
        HealthCheck { status: "ready", detail: "completion api key configured".to_string() }
    } else {
        HealthCheck { status: "degraded", detail: "llm.api_key is not set".to_string() }
    };

    let storage = match (state.storage_backend, state.integrations.storage_configured) {
        (StorageBackend::Memory, _) => {
            HealthCheck { status: "ready", detail: "in-memory order store".to_string() }
        }
        (StorageBackend::Document, true) => {
            HealthCheck { status: "ready", detail: "document store configured".to_string() }
        }
        (StorageBackend::Document, false) => HealthCheck {
            status: "degraded",
            detail: "storage.endpoint, storage.project_id and storage.api_key are required"
                .to_string(),
        },
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "kunan-server runtime initialized".to_string(),
        },
        completion,
        storage,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};

    use kunan_core::config::{IntegrationStatus, StorageBackend};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_when_integrations_are_configured() {
        let state = HealthState::new(
            IntegrationStatus { completion_configured: true, storage_configured: true },
            StorageBackend::Document,
        );

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.completion.status, "ready");
        assert_eq!(payload.storage.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_storage_is_missing() {
        let state = HealthState::new(
            IntegrationStatus { completion_configured: true, storage_configured: false },
            StorageBackend::Document,
        );

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.storage.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn memory_backend_only_needs_completion_key() {
        let state = HealthState::new(
            IntegrationStatus { completion_configured: false, storage_configured: true },
            StorageBackend::Memory,
        );

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.completion.status, "degraded");
        assert_eq!(payload.storage.status, "ready");
    }
}
