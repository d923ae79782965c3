//! HTTP error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

use prodcat_core::CatalogError;

/// Body of every failed response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A catalog error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError {
    error: CatalogError,
    expose_detail: bool,
}

impl ApiError {
    pub fn new(error: CatalogError, expose_detail: bool) -> Self {
        Self {
            error,
            expose_detail,
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.error {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::NoData => StatusCode::NOT_FOUND,
            CatalogError::QueryTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            e if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn inner(&self) -> &CatalogError {
        &self.error
    }

    fn body(&self) -> ErrorResponse {
        let status = self.status();
        let (message, error) = match &self.error {
            CatalogError::Validation(message) => (message.clone(), None),
            CatalogError::NoData => (self.error.to_string(), None),
            other => {
                let message = match status {
                    StatusCode::SERVICE_UNAVAILABLE => "catalog temporarily unavailable",
                    StatusCode::GATEWAY_TIMEOUT => "catalog query timed out",
                    _ => "internal server error",
                };
                let detail = if self.expose_detail {
                    other.to_string()
                } else {
                    "internal error".to_string()
                };
                (message.to_string(), Some(detail))
            }
        };

        ErrorResponse {
            success: false,
            message,
            error,
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self.error, "request failed");
        } else {
            warn!(status = %status, error = %self.error, "request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}
