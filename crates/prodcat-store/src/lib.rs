//! SQLite adapters for the product catalog lookup service.

mod catalog;
#[cfg(feature = "diagnostics")]
mod diagnostics;
mod executor;
mod functions;
mod pool;
mod query_builder;
mod statement;
mod statistics;

pub use catalog::SqliteProductCatalog;
#[cfg(feature = "diagnostics")]
pub use diagnostics::{DiagnosticExecutor, DIAGNOSTIC_ROW_CAP};
pub use executor::{FromCatalogRow, QueryExecutor};
pub use pool::{ConnectionPoolManager, PoolSettings, PoolStatus, PooledConnection, StartupPolicy};
pub use query_builder::{ProductQueryBuilder, PRODUCT_BASE_QUERY};
pub use statement::{BoundStatement, SqlValue};
pub use statistics::StatisticsAggregator;
