//! HTTP handlers for the catalog endpoints.

#[cfg(feature = "diagnostics")]
pub mod diagnostics;
pub mod health;
pub mod products;
pub mod reference;

use axum::http::{StatusCode, Uri};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[cfg(feature = "diagnostics")]
pub use diagnostics::run_query;
pub use health::{health, info};
pub use products::{export_products, search_products};
pub use reference::{list_families, list_users, statistics};

/// `{success, data, total, timestamp}` envelope for list endpoints.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: usize,
    pub timestamp: DateTime<Utc>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            total: data.len(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// `{success, data, timestamp}` envelope for single-object endpoints.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotFoundResponse {
    pub success: bool,
    pub message: &'static str,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> (StatusCode, Json<NotFoundResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            success: false,
            message: "route not found",
            path: uri.to_string(),
            timestamp: Utc::now(),
        }),
    )
}
