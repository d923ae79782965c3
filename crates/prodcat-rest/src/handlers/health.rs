//! Liveness and service description endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub status: DatabaseStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AppIdentity {
    pub name: String,
    pub version: String,
    pub environment: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the router was built.
    pub uptime: f64,
    pub database: DatabaseHealth,
    pub app: AppIdentity,
}

/// GET /health
///
/// 200 when the store answers a trivial round-trip, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    debug!("health check requested");
    let ready = state.catalog.is_ready().await;
    if !ready {
        warn!("health check: database unreachable");
    }

    let now = Utc::now();
    let body = HealthResponse {
        status: if ready {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        },
        timestamp: now,
        uptime: state.uptime_seconds(),
        database: DatabaseHealth {
            status: if ready {
                DatabaseStatus::Connected
            } else {
                DatabaseStatus::Disconnected
            },
            timestamp: now,
        },
        app: AppIdentity {
            name: state.config.app.name.clone(),
            version: state.config.app.version.clone(),
            environment: state.config.app.environment.as_str(),
        },
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub produtos: &'static str,
    pub export: &'static str,
    pub familias: &'static str,
    pub usuarios: &'static str,
    pub estatisticas: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub message: String,
    pub version: String,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub endpoints: Endpoints,
}

/// GET /api/info
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        message: format!("{} API", state.config.app.name),
        version: state.config.app.version.clone(),
        status: "online",
        timestamp: Utc::now(),
        endpoints: Endpoints {
            produtos: "/api/produtos",
            export: "/api/produtos/export",
            familias: "/api/familias",
            usuarios: "/api/usuarios",
            estatisticas: "/api/estatisticas",
            health: "/health",
        },
    })
}
