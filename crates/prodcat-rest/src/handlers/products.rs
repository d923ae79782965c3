//! Product lookup and export endpoints.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use prodcat_core::{
    CatalogError, ColumnProjector, FilterCriteria, LookupMode, ProductRecord, RawFilter,
};

use crate::error::ApiError;
use crate::export::{render_workbook, XLSX_CONTENT_TYPE, XLSX_DISPOSITION};
use crate::state::AppState;

/// Interactive lookup envelope; `filtros` echoes the applied criteria.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub success: bool,
    pub data: Vec<ProductRecord>,
    pub total: usize,
    pub filtros: FilterCriteria,
    pub timestamp: DateTime<Utc>,
}

/// Export parameters: the lookup filters plus the column selection.
#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    #[serde(flatten)]
    pub filter: RawFilter,
    /// Comma-separated column identifiers (`col-ean,col-estoque`).
    #[serde(default, rename = "visibleColumns")]
    pub visible_columns: Option<String>,
}

impl ExportParams {
    fn columns(&self) -> Vec<&str> {
        self.visible_columns
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// GET /api/produtos
#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    Query(raw): Query<RawFilter>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let criteria = raw
        .into_criteria(LookupMode::Interactive, &state.config.query)
        .map_err(|e| state.reject(e))?;

    let data = state
        .catalog
        .search_products(&criteria, LookupMode::Interactive)
        .await
        .map_err(|e| state.reject(e))?;

    info!(rows = data.len(), "product lookup completed");
    Ok(Json(ProductsResponse {
        success: true,
        total: data.len(),
        data,
        filtros: criteria,
        timestamp: Utc::now(),
    }))
}

/// GET /api/produtos/export
#[instrument(skip(state))]
pub async fn export_products(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let criteria = params
        .filter
        .clone()
        .into_criteria(LookupMode::Export, &state.config.query)
        .map_err(|e| state.reject(e))?;

    let records = state
        .catalog
        .search_products(&criteria, LookupMode::Export)
        .await
        .map_err(|e| state.reject(e))?;
    if records.is_empty() {
        return Err(state.reject(CatalogError::NoData));
    }

    let columns = params.columns();
    let projected = ColumnProjector::project(records, Some(columns.as_slice()));
    let bytes = render_workbook(&projected).map_err(|e| state.reject(e))?;

    info!(
        rows = projected.len(),
        columns = projected.columns().len(),
        bytes = bytes.len(),
        "product export rendered"
    );
    Ok((
        [
            (CONTENT_TYPE, XLSX_CONTENT_TYPE),
            (CONTENT_DISPOSITION, XLSX_DISPOSITION),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_columns_are_split_and_trimmed() {
        let params = ExportParams {
            visible_columns: Some("col-ean, col-estoque,,col-uf ".into()),
            ..ExportParams::default()
        };
        assert_eq!(params.columns(), vec!["col-ean", "col-estoque", "col-uf"]);
        assert!(ExportParams::default().columns().is_empty());
    }
}
