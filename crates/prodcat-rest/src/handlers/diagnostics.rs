//! Raw SQL endpoint for local troubleshooting.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

use prodcat_core::CatalogError;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub data: Vec<Map<String, Value>>,
    pub total: usize,
    pub sql: String,
    pub timestamp: DateTime<Utc>,
}

/// POST /api/query
///
/// Only routed when a diagnostic executor was created at startup.
#[instrument(skip(state, request), fields(params = request.params.len()))]
pub async fn run_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Some(executor) = state.diagnostics.as_ref() else {
        return Err(state.reject(CatalogError::validation(
            "diagnostics are disabled in this environment",
        )));
    };

    warn!(sql = %request.sql, "executing diagnostic statement");
    let data = executor
        .execute(&request.sql, &request.params)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(QueryResponse {
        success: true,
        total: data.len(),
        data,
        sql: request.sql,
        timestamp: Utc::now(),
    }))
}
