use std::sync::Arc;

use anyhow::Context;
use prodcat_core::AppConfig;
use prodcat_rest::{build_router, telemetry, AppState};
use prodcat_store::{ConnectionPoolManager, PoolSettings, SqliteProductCatalog, StartupPolicy};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    telemetry::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!(
        name = %config.app.name,
        version = %config.app.version,
        environment = config.app.environment.as_str(),
        "starting catalog service"
    );

    let pool = Arc::new(ConnectionPoolManager::new(PoolSettings::from(
        &config.database,
    )));
    if let Err(e) = pool.start(&StartupPolicy::from(&config.startup)).await {
        error!(error = %e, "catalog store unreachable, exiting");
        std::process::exit(1);
    }

    let catalog = Arc::new(SqliteProductCatalog::new(Arc::clone(&pool), &config.query));
    let config = Arc::new(config);
    let state = AppState::new(catalog, Arc::clone(&config));

    #[cfg(feature = "diagnostics")]
    let state = match prodcat_store::DiagnosticExecutor::for_environment(
        config.app.environment,
        Arc::clone(&pool),
        &config.query,
    ) {
        Some(executor) => state.with_diagnostics(Arc::new(executor)),
        None => state,
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "REST server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.shutdown().await;
    info!("server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
