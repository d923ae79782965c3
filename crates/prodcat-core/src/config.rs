//! Configuration management for the catalog service
//!
//! Sources, lowest to highest precedence:
//! - Hardcoded defaults
//! - ./config/prodcat.{toml,yaml}
//! - Config file named by the PRODCAT_CONFIG env var
//! - Environment variables (`PRODCAT_DATABASE__URL=...`)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppInfoConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub startup: StartupConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from all sources and validate it.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        builder = builder.add_source(File::with_name("./config/prodcat").required(false));

        if let Ok(config_path) = std::env::var("PRODCAT_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        // Example: PRODCAT_QUERY__EXCLUDED_COMPANIES=1,4,38
        builder = builder.add_source(
            Environment::with_prefix("PRODCAT")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("query.excluded_companies")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = AppConfig::default();
        builder
            .set_default("app.name", defaults.app.name)?
            .set_default("app.version", defaults.app.version)?
            .set_default("app.environment", "production")?
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.pool_min", i64::from(defaults.database.pool_min))?
            .set_default("database.pool_max", i64::from(defaults.database.pool_max))?
            .set_default(
                "database.pool_increment",
                i64::from(defaults.database.pool_increment),
            )?
            .set_default("database.acquire_timeout_ms", 30_000)?
            .set_default("startup.max_attempts", 3)?
            .set_default("startup.attempt_timeout_ms", 10_000)?
            .set_default("startup.backoff_ms", 2_000)?
            .set_default("query.default_limit", 100)?
            .set_default("query.max_limit", 1_000)?
            .set_default("query.export_default_limit", 1_000)?
            .set_default("query.export_max_limit", 10_000)?
            .set_default("query.reference_row_cap", 1_000)?
            .set_default("query.statement_timeout_ms", 30_000)?
            .set_default("query.excluded_companies", vec![1, 4, 22, 33, 34, 38])?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database.url cannot be empty".to_string(),
            ));
        }

        if self.database.pool_max == 0 {
            return Err(ConfigError::Message(
                "database.pool_max must be > 0".to_string(),
            ));
        }

        if self.database.pool_min > self.database.pool_max {
            return Err(ConfigError::Message(
                "database.pool_min must be <= database.pool_max".to_string(),
            ));
        }

        if self.database.pool_increment == 0 {
            return Err(ConfigError::Message(
                "database.pool_increment must be > 0".to_string(),
            ));
        }

        if self.database.acquire_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "database.acquire_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.startup.max_attempts == 0 {
            return Err(ConfigError::Message(
                "startup.max_attempts must be > 0".to_string(),
            ));
        }

        let query = &self.query;
        if query.max_limit == 0 || query.default_limit == 0 || query.default_limit > query.max_limit
        {
            return Err(ConfigError::Message(
                "query.default_limit must be within 1..=query.max_limit".to_string(),
            ));
        }

        if query.export_default_limit == 0 || query.export_default_limit > query.export_max_limit {
            return Err(ConfigError::Message(
                "query.export_default_limit must be within 1..=query.export_max_limit".to_string(),
            ));
        }

        if query.statement_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "query.statement_timeout_ms must be > 0".to_string(),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::Message(format!(
                "logging.format must be one of: {}",
                valid_formats.join(", ")
            )));
        }

        Ok(())
    }
}

/// Deployment environment, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    Development,
    Test,
    #[default]
    Production,
}

impl RuntimeEnvironment {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    /// Whether store error messages may be shown to callers.
    pub const fn exposes_error_detail(&self) -> bool {
        !matches!(self, Self::Production)
    }

    /// Whether the raw SQL diagnostic endpoint may be mounted.
    pub const fn allows_diagnostics(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Application identity
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppInfoConfig {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub environment: RuntimeEnvironment,
}

impl Default for AppInfoConfig {
    fn default() -> Self {
        Self {
            name: "Product Catalog Lookup".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: RuntimeEnvironment::default(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Connection pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://catalog.db`
    pub url: String,

    /// Connections kept open while idle
    pub pool_min: u32,

    /// Upper bound on open connections
    pub pool_max: u32,

    /// Connections opened per growth step
    pub pool_increment: u32,

    /// How long `acquire` waits before reporting exhaustion
    pub acquire_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://catalog.db".to_string(),
            pool_min: 2,
            pool_max: 10,
            pool_increment: 1,
            acquire_timeout_ms: 30_000,
        }
    }
}

/// Startup connectivity retry policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartupConfig {
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
    pub backoff_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout_ms: 10_000,
            backoff_ms: 2_000,
        }
    }
}

/// Lookup bounds and business rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Limit used by interactive lookups that send none
    pub default_limit: u32,

    /// Largest limit an interactive lookup may request
    pub max_limit: u32,

    pub export_default_limit: u32,
    pub export_max_limit: u32,

    /// Row cap for the family and user listings
    pub reference_row_cap: usize,

    pub statement_timeout_ms: u64,

    /// Companies never returned by product lookups
    pub excluded_companies: Vec<i64>,
}

impl QueryConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1_000,
            export_default_limit: 1_000,
            export_max_limit: 10_000,
            reference_row_cap: 1_000,
            statement_timeout_ms: 30_000,
            excluded_companies: vec![1, 4, 22, 33, 34, 38],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,

    /// `json` or `pretty`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
