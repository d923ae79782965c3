//! HTTP surface of the product catalog lookup service.

pub mod error;
pub mod export;
pub mod handlers;
pub mod rest;
pub mod state;
pub mod telemetry;

pub use error::{ApiError, ErrorResponse};
pub use export::render_workbook;
pub use rest::build_router;
pub use state::AppState;
