use thiserror::Error;

/// Canonical error type for catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Caller input is missing, malformed or out of range.
    #[error("validation error: {0}")]
    Validation(String),

    /// The connection pool was never initialized or has been shut down.
    #[error("connection pool is not initialized")]
    PoolUninitialized,

    /// No connection became available before the acquire timeout elapsed.
    #[error("connection pool exhausted: no connection available within {timeout_ms} ms")]
    PoolExhausted {
        /// Acquire timeout that elapsed.
        timeout_ms: u64,
    },

    /// Startup connectivity check failed on every attempt.
    #[error("database unreachable after {attempts} attempt(s): {last_error}")]
    StartupFailed {
        /// Number of attempts made.
        attempts: u32,
        /// Failure reported by the last attempt.
        last_error: String,
    },

    /// The store rejected or failed to run a statement.
    #[error("query execution failed: {message}")]
    QueryExecution {
        /// Driver message, only shown to callers outside production.
        message: String,
    },

    /// Statement execution exceeded its time budget.
    #[error("query timed out after {timeout_ms} ms")]
    QueryTimeout {
        /// Statement timeout that elapsed.
        timeout_ms: u64,
    },

    /// One of the statistics sub-queries failed.
    #[error("statistics unavailable: {source}")]
    StatisticsUnavailable {
        /// First sub-query failure.
        #[source]
        source: Box<CatalogError>,
    },

    /// An export matched no rows.
    #[error("no products matched the given filters")]
    NoData,

    /// Spreadsheet rendering failed.
    #[error("export error: {0}")]
    Export(String),
}

impl CatalogError {
    /// Creates a `Validation` variant.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a `QueryExecution` variant.
    #[must_use]
    pub fn query_execution(message: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: message.into(),
        }
    }

    /// Wraps a sub-query failure into `StatisticsUnavailable`.
    #[must_use]
    pub fn statistics_unavailable(source: CatalogError) -> Self {
        Self::StatisticsUnavailable {
            source: Box::new(source),
        }
    }

    /// True for errors caused by pool state rather than by the statement.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::PoolUninitialized
                | Self::PoolExhausted { .. }
                | Self::StartupFailed { .. }
                | Self::StatisticsUnavailable { .. }
        )
    }
}

/// Convenient result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
