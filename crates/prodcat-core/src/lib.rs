//! Core domain types and contracts for the product catalog lookup service.

pub mod config;
pub mod criteria;
pub mod error;
pub mod projection;
pub mod record;
pub mod traits;

pub use config::{
    AppConfig, AppInfoConfig, DatabaseConfig, LoggingConfig, QueryConfig, RuntimeEnvironment,
    ServerConfig, StartupConfig,
};
pub use criteria::{FilterCriteria, LookupMode, RawFilter};
pub use error::{CatalogError, CatalogResult};
pub use projection::{field_for_column, ColumnProjector, ProjectedRows, MANDATORY_FIELDS};
pub use record::{
    FamilyRecord, FieldValue, ProductField, ProductRecord, StatisticsSummary, UserRecord,
};
pub use traits::ProductCatalog;
