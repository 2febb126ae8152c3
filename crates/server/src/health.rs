use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use foafrag_core::config::AppConfig;
use foafrag_store::StoreClient;

#[derive(Clone)]
pub struct HealthState {
    store: StoreClient,
    store_kind: String,
    model: String,
}

impl HealthState {
    pub fn new(config: &AppConfig, store: StoreClient) -> Self {
        Self {
            store,
            store_kind: format!("{:?}", config.store.kind),
            model: format!("{:?}/{}", config.llm.provider, config.llm.model),
        }
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
    pub store: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let store = store_check(&state).await;
    let ready = store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("pipeline initialized with model {}", state.model),
        },
        store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn store_check(state: &HealthState) -> HealthCheck {
    if state.store.test_connectivity().await {
        HealthCheck {
            status: "ready",
            detail: format!("{} store reachable", state.store_kind),
        }
    } else {
        HealthCheck {
            status: "degraded",
            detail: format!("{} store unreachable", state.store_kind),
        }
    }
}
