mod common;

use std::sync::Arc;
use std::time::Duration;

use prodcat_core::{
    CatalogError, CatalogResult, FilterCriteria, LookupMode, ProductCatalog, QueryConfig,
};
use prodcat_store::{
    BoundStatement, ConnectionPoolManager, FromCatalogRow, PoolSettings, QueryExecutor,
    SqliteProductCatalog, StartupPolicy,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use common::{create_catalog, database_url, settings_for, temp_db_path};

struct Total(i64);

impl FromCatalogRow for Total {
    fn from_row(row: &SqliteRow) -> CatalogResult<Self> {
        row.try_get("TOTAL")
            .map(Total)
            .map_err(|e| CatalogError::query_execution(e.to_string()))
    }
}

fn quick_policy() -> StartupPolicy {
    StartupPolicy {
        max_attempts: 3,
        attempt_timeout: Duration::from_secs(2),
        backoff: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn start_succeeds_against_reachable_store() {
    let path = create_catalog(true).await;
    let pool = ConnectionPoolManager::new(settings_for(&path));

    pool.start(&quick_policy()).await.expect("start");

    assert!(pool.is_initialized());
    assert!(pool.test_connectivity().await);
    let status = pool.status().expect("status");
    assert!(status.size >= 1);
}

#[tokio::test]
async fn start_gives_up_after_bounded_attempts() {
    let missing = temp_db_path();
    let pool = ConnectionPoolManager::new(PoolSettings {
        url: database_url(&missing),
        min_connections: 0,
        max_connections: 2,
        increment: 1,
        acquire_timeout: Duration::from_millis(500),
    });

    let err = pool.start(&quick_policy()).await.expect_err("unreachable");

    match err {
        CatalogError::StartupFailed { attempts, last_error } => {
            assert_eq!(attempts, 3);
            assert!(!last_error.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!pool.is_initialized());
    assert!(!missing.exists());
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let path = create_catalog(false).await;
    let pool = ConnectionPoolManager::new(settings_for(&path));

    pool.initialize().await.expect("first");
    pool.initialize().await.expect("second");

    assert!(pool.is_initialized());
    assert!(pool.status().expect("status").size <= 5);
}

#[tokio::test]
async fn acquire_before_initialize_fails() {
    let path = create_catalog(false).await;
    let pool = ConnectionPoolManager::new(settings_for(&path));

    let err = pool.acquire().await.err().expect("uninitialized");
    assert!(matches!(err, CatalogError::PoolUninitialized));
    assert!(!pool.test_connectivity().await);
    assert!(!pool.is_ready().await);
}

#[tokio::test]
async fn acquire_after_shutdown_fails() {
    let path = create_catalog(false).await;
    let pool = ConnectionPoolManager::new(settings_for(&path));
    pool.initialize().await.expect("initialize");

    pool.shutdown().await;
    pool.shutdown().await;

    let err = pool.acquire().await.err().expect("closed");
    assert!(matches!(err, CatalogError::PoolUninitialized));
    assert!(pool.status().is_none());
}

#[tokio::test]
async fn exhausted_pool_times_out() {
    let path = create_catalog(false).await;
    let pool = ConnectionPoolManager::new(PoolSettings {
        max_connections: 1,
        min_connections: 1,
        acquire_timeout: Duration::from_millis(100),
        ..settings_for(&path)
    });
    pool.initialize().await.expect("initialize");

    let held = pool.acquire().await.expect("first connection");
    let err = pool.acquire().await.err().expect("pool exhausted");
    assert!(matches!(err, CatalogError::PoolExhausted { timeout_ms: 100 }));

    pool.release(held).await;
    let again = pool.acquire().await.expect("released connection");
    pool.release(again).await;
}

#[tokio::test]
async fn released_connections_are_reused() {
    let path = create_catalog(true).await;
    let pool = Arc::new(ConnectionPoolManager::new(PoolSettings {
        max_connections: 1,
        min_connections: 1,
        acquire_timeout: Duration::from_millis(200),
        ..settings_for(&path)
    }));
    pool.initialize().await.expect("initialize");
    let catalog = SqliteProductCatalog::new(Arc::clone(&pool), &QueryConfig::default());

    for _ in 0..5 {
        catalog
            .search_products(
                &FilterCriteria::new(10).with_description("arroz"),
                LookupMode::Interactive,
            )
            .await
            .expect("search");
    }
    let summary = catalog.statistics().await.expect("sub-queries share one connection");
    assert_eq!(summary.total_products, 6);
    assert_eq!(pool.status().map(|status| status.size), Some(1));
}

#[tokio::test]
async fn slow_statement_times_out_and_pool_recovers() {
    let path = create_catalog(true).await;
    let pool = Arc::new(ConnectionPoolManager::new(settings_for(&path)));
    pool.initialize().await.expect("initialize");

    let executor = QueryExecutor::new(Arc::clone(&pool), Duration::from_millis(1));
    let slow = BoundStatement::new(
        "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 50000000)
         SELECT COUNT(*) AS TOTAL FROM c",
    );

    let err = executor
        .run::<Total>(&slow, 1)
        .await
        .err()
        .expect("timeout");
    assert!(matches!(err, CatalogError::QueryTimeout { timeout_ms: 1 }));

    let patient = QueryExecutor::new(Arc::clone(&pool), Duration::from_secs(5));
    let rows = patient
        .run::<Total>(&BoundStatement::new("SELECT COUNT(*) AS TOTAL FROM map_produto"), 10)
        .await
        .expect("pool still usable");
    assert_eq!(rows.first().map(|total| total.0), Some(6));
}

#[tokio::test]
async fn unbound_placeholder_is_rejected() {
    let path = create_catalog(false).await;
    let pool = Arc::new(ConnectionPoolManager::new(settings_for(&path)));
    pool.initialize().await.expect("initialize");
    let executor = QueryExecutor::new(pool, Duration::from_secs(1));

    let err = executor
        .run::<Total>(
            &BoundStatement::new("SELECT COUNT(*) AS TOTAL FROM map_produto WHERE seqproduto = :code"),
            1,
        )
        .await
        .err()
        .expect("unbound");
    assert!(matches!(err, CatalogError::QueryExecution { .. }));
}

#[cfg(feature = "diagnostics")]
mod diagnostics {
    use super::*;
    use prodcat_core::RuntimeEnvironment;
    use prodcat_store::DiagnosticExecutor;
    use serde_json::json;

    #[tokio::test]
    async fn raw_statements_return_json_rows() {
        let path = create_catalog(true).await;
        let pool = Arc::new(ConnectionPoolManager::new(settings_for(&path)));
        pool.initialize().await.expect("initialize");
        let executor = DiagnosticExecutor::for_environment(
            RuntimeEnvironment::Development,
            Arc::clone(&pool),
            &QueryConfig::default(),
        )
        .expect("development executor");

        let rows = executor
            .execute(
                "SELECT seqproduto, descreduzida FROM map_produto WHERE seqfamilia = ? ORDER BY seqproduto",
                &[json!(30)],
            )
            .await
            .expect("execute");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["seqproduto"], json!(4700));
        assert_eq!(rows[0]["descreduzida"], json!("DESCONTO 50% ACUCAR"));
    }

    #[tokio::test]
    async fn invalid_sql_is_a_query_error() {
        let path = create_catalog(false).await;
        let pool = Arc::new(ConnectionPoolManager::new(settings_for(&path)));
        pool.initialize().await.expect("initialize");
        let executor = DiagnosticExecutor::for_environment(
            RuntimeEnvironment::Development,
            pool,
            &QueryConfig::default(),
        )
        .expect("development executor");

        let err = executor
            .execute("SELEC nothing", &[])
            .await
            .expect_err("syntax error");
        assert!(matches!(err, CatalogError::QueryExecution { .. }));

        let err = executor.execute("   ", &[]).await.expect_err("blank");
        assert!(matches!(err, CatalogError::Validation(_)));
    }
}
