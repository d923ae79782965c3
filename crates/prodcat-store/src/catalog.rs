//! SQLite-backed implementation of [`ProductCatalog`].

use std::sync::Arc;

use async_trait::async_trait;

use prodcat_core::{
    CatalogResult, FamilyRecord, FilterCriteria, LookupMode, ProductCatalog, ProductRecord,
    QueryConfig, StatisticsSummary, UserRecord,
};

use crate::executor::QueryExecutor;
use crate::pool::ConnectionPoolManager;
use crate::query_builder::ProductQueryBuilder;
use crate::statement::BoundStatement;
use crate::statistics::StatisticsAggregator;

const LIST_FAMILIES: &str = "SELECT DISTINCT seqfamilia AS CODIGO_FAMILIA, descricao AS DESCRICAO
FROM map_familia
ORDER BY descricao";

const LIST_USERS: &str = "SELECT DISTINCT codusuario AS CODUSUARIO, nome AS NOME
FROM ge_usuario
ORDER BY nome";

/// Product catalog reading through a shared [`ConnectionPoolManager`].
pub struct SqliteProductCatalog {
    pool: Arc<ConnectionPoolManager>,
    builder: ProductQueryBuilder,
    executor: QueryExecutor,
    statistics: StatisticsAggregator,
    reference_row_cap: usize,
}

impl SqliteProductCatalog {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPoolManager>, config: &QueryConfig) -> Self {
        let executor = QueryExecutor::new(Arc::clone(&pool), config.statement_timeout());
        Self {
            pool,
            builder: ProductQueryBuilder::new(config),
            statistics: StatisticsAggregator::new(executor.clone()),
            executor,
            reference_row_cap: config.reference_row_cap,
        }
    }

    pub fn pool(&self) -> &Arc<ConnectionPoolManager> {
        &self.pool
    }
}

#[async_trait]
impl ProductCatalog for SqliteProductCatalog {
    #[tracing::instrument(skip(self, criteria), fields(limit = criteria.limit(), mode = ?mode))]
    async fn search_products(
        &self,
        criteria: &FilterCriteria,
        mode: LookupMode,
    ) -> CatalogResult<Vec<ProductRecord>> {
        let statement = self.builder.build(criteria, mode)?;
        self.executor
            .run(&statement, criteria.limit() as usize)
            .await
    }

    async fn list_families(&self) -> CatalogResult<Vec<FamilyRecord>> {
        self.executor
            .run(&BoundStatement::new(LIST_FAMILIES), self.reference_row_cap)
            .await
    }

    async fn list_users(&self) -> CatalogResult<Vec<UserRecord>> {
        self.executor
            .run(&BoundStatement::new(LIST_USERS), self.reference_row_cap)
            .await
    }

    async fn statistics(&self) -> CatalogResult<StatisticsSummary> {
        self.statistics.collect().await
    }

    async fn is_ready(&self) -> bool {
        self.pool.is_ready().await
    }
}
