//! Catalog-wide counters collected by four concurrent sub-queries.

use chrono::NaiveDateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::warn;

use prodcat_core::{CatalogError, CatalogResult, StatisticsSummary};

use crate::executor::{FromCatalogRow, QueryExecutor};
use crate::statement::BoundStatement;

const PRODUCT_COUNT: &str = "SELECT COUNT(*) AS TOTAL FROM map_produto";
const FAMILY_COUNT: &str = "SELECT COUNT(*) AS TOTAL FROM map_familia";
const USER_COUNT: &str = "SELECT COUNT(*) AS TOTAL FROM ge_usuario";
const LAST_INCLUSION: &str =
    "SELECT MAX(dtahorinclusao) AS ULTIMA_ATUALIZACAO FROM map_produto";

struct Total(i64);

impl FromCatalogRow for Total {
    fn from_row(row: &SqliteRow) -> CatalogResult<Self> {
        row.try_get("TOTAL")
            .map(Total)
            .map_err(|e| CatalogError::query_execution(format!("column TOTAL: {e}")))
    }
}

struct LastInclusion(Option<NaiveDateTime>);

impl FromCatalogRow for LastInclusion {
    fn from_row(row: &SqliteRow) -> CatalogResult<Self> {
        row.try_get("ULTIMA_ATUALIZACAO")
            .map(LastInclusion)
            .map_err(|e| {
                CatalogError::query_execution(format!("column ULTIMA_ATUALIZACAO: {e}"))
            })
    }
}

/// Merges the product, family and user counts and the newest inclusion
/// timestamp into one [`StatisticsSummary`].
#[derive(Clone)]
pub struct StatisticsAggregator {
    executor: QueryExecutor,
}

impl StatisticsAggregator {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// Runs the four sub-queries concurrently, one connection each.
    ///
    /// The first failure cancels the others and is reported as
    /// `StatisticsUnavailable`.
    pub async fn collect(&self) -> CatalogResult<StatisticsSummary> {
        let (total_products, total_families, total_users, last_inclusion) = tokio::try_join!(
            self.count(PRODUCT_COUNT),
            self.count(FAMILY_COUNT),
            self.count(USER_COUNT),
            self.last_inclusion(),
        )
        .map_err(|e| {
            warn!(error = %e, "statistics sub-query failed");
            CatalogError::statistics_unavailable(e)
        })?;

        Ok(StatisticsSummary {
            total_products,
            total_families,
            total_users,
            last_inclusion,
        })
    }

    async fn count(&self, sql: &'static str) -> CatalogResult<i64> {
        let rows: Vec<Total> = self.executor.run(&BoundStatement::new(sql), 1).await?;
        Ok(rows.first().map_or(0, |total| total.0))
    }

    async fn last_inclusion(&self) -> CatalogResult<Option<NaiveDateTime>> {
        let rows: Vec<LastInclusion> = self
            .executor
            .run(&BoundStatement::new(LAST_INCLUSION), 1)
            .await?;
        Ok(rows.into_iter().next().and_then(|row| row.0))
    }
}
