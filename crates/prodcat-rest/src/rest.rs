use std::time::Duration;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info_span, Span};
use uuid::Uuid;

use crate::handlers;
use crate::state::AppState;

/// Builds the catalog router: routes, 404 fallback, identity headers,
/// CORS and request logging.
pub fn build_router(state: AppState) -> Router {
    let app_name = header_value(&state.config.app.name, "prodcat");
    let app_version = header_value(&state.config.app.version, env!("CARGO_PKG_VERSION"));

    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/info", get(handlers::info))
        .route("/api/produtos", get(handlers::search_products))
        .route("/api/produtos/export", get(handlers::export_products))
        .route("/api/familias", get(handlers::list_families))
        .route("/api/usuarios", get(handlers::list_users))
        .route("/api/estatisticas", get(handlers::statistics));

    #[cfg(feature = "diagnostics")]
    let router = if state.diagnostics.is_some() {
        tracing::warn!("mounting POST /api/query");
        router.route("/api/query", axum::routing::post(handlers::run_query))
    } else {
        router
    };

    router
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-app-name"),
            app_name,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-app-version"),
            app_version,
        ))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    info_span!(
                        "http_request",
                        request_id = %Uuid::new_v4(),
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_request(|_request: &Request, _span: &Span| {
                    tracing::debug!("started processing request");
                })
                .on_response(|response: &Response, latency: Duration, _span: &Span| {
                    let status = response.status();
                    let latency_ms = latency.as_millis() as u64;
                    if status.is_server_error() {
                        tracing::error!(status = %status, latency_ms, "request failed with server error");
                    } else if status.is_client_error() {
                        tracing::warn!(status = %status, latency_ms, "request failed with client error");
                    } else {
                        tracing::info!(status = %status, latency_ms, "request completed");
                    }
                })
                .on_failure(
                    |failure_class: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                        tracing::error!(
                            failure_class = ?failure_class,
                            latency_ms = latency.as_millis() as u64,
                            "request failed"
                        );
                    },
                ),
        )
}

fn header_value(value: &str, fallback: &'static str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(fallback))
}
