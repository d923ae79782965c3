//! Shared state handed to every handler.

use std::sync::Arc;
use std::time::Instant;

use prodcat_core::{AppConfig, CatalogError, ProductCatalog};
#[cfg(feature = "diagnostics")]
use prodcat_store::DiagnosticExecutor;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn ProductCatalog>,
    pub config: Arc<AppConfig>,
    started_at: Instant,
    /// Present only in development builds with the `diagnostics` feature.
    #[cfg(feature = "diagnostics")]
    pub diagnostics: Option<Arc<DiagnosticExecutor>>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn ProductCatalog>, config: Arc<AppConfig>) -> Self {
        Self {
            catalog,
            config,
            started_at: Instant::now(),
            #[cfg(feature = "diagnostics")]
            diagnostics: None,
        }
    }

    #[cfg(feature = "diagnostics")]
    #[must_use]
    pub fn with_diagnostics(mut self, executor: Arc<DiagnosticExecutor>) -> Self {
        self.diagnostics = Some(executor);
        self
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Wraps a catalog error for the HTTP boundary, honouring the
    /// environment's error detail policy.
    pub fn reject(&self, error: CatalogError) -> ApiError {
        ApiError::new(error, self.config.app.environment.exposes_error_detail())
    }
}
