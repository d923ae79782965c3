use async_trait::async_trait;

use crate::criteria::{FilterCriteria, LookupMode};
use crate::error::CatalogResult;
use crate::record::{FamilyRecord, ProductRecord, StatisticsSummary, UserRecord};

/// Read-only access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns at most `criteria.limit()` products, newest inclusion first.
    ///
    /// Criteria that violate the invariants of `mode` are rejected before
    /// any storage access.
    async fn search_products(
        &self,
        criteria: &FilterCriteria,
        mode: LookupMode,
    ) -> CatalogResult<Vec<ProductRecord>>;

    /// Lists all product families ordered by description.
    async fn list_families(&self) -> CatalogResult<Vec<FamilyRecord>>;

    /// Lists all catalog users ordered by name.
    async fn list_users(&self) -> CatalogResult<Vec<UserRecord>>;

    /// Collects catalog-wide counters; partial results are never returned.
    async fn statistics(&self) -> CatalogResult<StatisticsSummary>;

    /// True when the store is initialized and answers a trivial round-trip.
    async fn is_ready(&self) -> bool;
}
