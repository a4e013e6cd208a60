//! Liveness endpoint backed by the quota store

use crate::storage::QuotaStore;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

const LANDING_PAGE: &str = include_str!("../../static/index.html");

/// Body of a `/health` response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HealthReport {
    Healthy {
        status: &'static str,
        database: &'static str,
        timestamp: DateTime<Utc>,
    },
    Unhealthy {
        status: &'static str,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl HealthReport {
    pub fn healthy() -> Self {
        HealthReport::Healthy {
            status: "healthy",
            database: "connected",
            timestamp: Utc::now(),
        }
    }

    pub fn unhealthy(error: impl ToString) -> Self {
        HealthReport::Unhealthy {
            status: "unhealthy",
            error: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

async fn health_check(State(store): State<Arc<QuotaStore>>) -> Response {
    match store.ping().await {
        Ok(_) => (StatusCode::OK, Json(HealthReport::healthy())).into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthReport::unhealthy(e)),
            )
                .into_response()
        }
    }
}

async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// Create health router
pub fn create_router(store: Arc<QuotaStore>) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/health", get(health_check))
        .with_state(store)
}
