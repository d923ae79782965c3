//! Reference listings and catalog statistics.

use axum::extract::State;
use axum::Json;
use tracing::instrument;

use prodcat_core::{FamilyRecord, StatisticsSummary, UserRecord};

use super::{DataResponse, ListResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/familias
#[instrument(skip(state))]
pub async fn list_families(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<FamilyRecord>>, ApiError> {
    let families = state
        .catalog
        .list_families()
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(ListResponse::new(families)))
}

/// GET /api/usuarios
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<UserRecord>>, ApiError> {
    let users = state
        .catalog
        .list_users()
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(ListResponse::new(users)))
}

/// GET /api/estatisticas
#[instrument(skip(state))]
pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<StatisticsSummary>>, ApiError> {
    let summary = state
        .catalog
        .statistics()
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(DataResponse::new(summary)))
}
