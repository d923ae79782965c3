//! Connection pool lifecycle.
//!
//! One [`ConnectionPoolManager`] is built by the process entry point and
//! shared by reference with every component that reads the catalog.
//! Connections are handed out as [`PooledConnection`]s and go back through
//! [`ConnectionPoolManager::release`].

use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::time::Duration;

use parking_lot::RwLock;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection, Sqlite, SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use prodcat_core::{CatalogError, CatalogResult, DatabaseConfig, StartupConfig};

use crate::functions::register_unicode_upper;

/// Pool sizing and acquire behaviour.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    /// Growth step. sqlx opens connections one at a time on demand, so
    /// this is reported but never exceeds one in practice.
    pub increment: u32,
    pub acquire_timeout: Duration,
}

impl From<&DatabaseConfig> for PoolSettings {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            min_connections: config.pool_min,
            max_connections: config.pool_max,
            increment: config.pool_increment,
            acquire_timeout: config.acquire_timeout(),
        }
    }
}

/// Bounded retry policy for the startup connectivity check.
#[derive(Debug, Clone)]
pub struct StartupPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Duration,
}

impl Default for StartupPolicy {
    fn default() -> Self {
        Self::from(&StartupConfig::default())
    }
}

impl From<&StartupConfig> for StartupPolicy {
    fn from(config: &StartupConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            attempt_timeout: Duration::from_millis(config.attempt_timeout_ms),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
}

/// An exclusive connection checked out of the pool.
///
/// Dropping it without [`ConnectionPoolManager::release`] still returns
/// the connection to the pool.
pub struct PooledConnection {
    inner: PoolConnection<Sqlite>,
    discard: bool,
}

impl PooledConnection {
    /// Marks the connection as unusable; release will close it instead of
    /// returning it to the pool.
    pub fn mark_broken(&mut self) {
        self.discard = true;
    }

    pub fn is_broken(&self) -> bool {
        self.discard
    }
}

impl Deref for PooledConnection {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Owns the process-wide connection pool.
pub struct ConnectionPoolManager {
    settings: PoolSettings,
    pool: RwLock<Option<SqlitePool>>,
    init_lock: Mutex<()>,
}

impl ConnectionPoolManager {
    /// Creates an uninitialized manager. Call [`Self::initialize`] or
    /// [`Self::start`] before acquiring connections.
    #[must_use]
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            settings,
            pool: RwLock::new(None),
            init_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Opens the pool. Calling it again on an open pool is a no-op.
    pub async fn initialize(&self) -> CatalogResult<()> {
        let _guard = self.init_lock.lock().await;
        if self.is_initialized() {
            debug!("connection pool already initialized");
            return Ok(());
        }

        let options = SqliteConnectOptions::from_str(&self.settings.url)
            .map_err(|e| CatalogError::query_execution(format!("invalid database url: {e}")))?
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .min_connections(self.settings.min_connections)
            .max_connections(self.settings.max_connections)
            .acquire_timeout(self.settings.acquire_timeout)
            .after_connect(|connection, _meta| {
                Box::pin(async move { register_unicode_upper(connection).await })
            })
            .connect_with(options)
            .await
            .map_err(|e| {
                CatalogError::query_execution(format!("failed to open connection pool: {e}"))
            })?;

        *self.pool.write() = Some(pool);
        info!(
            min = self.settings.min_connections,
            max = self.settings.max_connections,
            increment = self.settings.increment,
            "connection pool created"
        );
        Ok(())
    }

    /// Opens the pool and verifies connectivity under `policy`.
    ///
    /// Each attempt is bounded by `policy.attempt_timeout`, with
    /// `policy.backoff` between attempts. When every attempt fails the
    /// pool is closed and `StartupFailed` is returned; the service is not
    /// expected to run without its store.
    pub async fn start(&self, policy: &StartupPolicy) -> CatalogResult<()> {
        let mut last_error = String::new();

        for attempt in 1..=policy.max_attempts {
            let outcome = tokio::time::timeout(policy.attempt_timeout, async {
                self.initialize().await?;
                Ok::<bool, CatalogError>(self.test_connectivity().await)
            })
            .await;

            match outcome {
                Ok(Ok(true)) => {
                    info!(attempt, "database connectivity verified");
                    return Ok(());
                }
                Ok(Ok(false)) => last_error = "connectivity check failed".to_string(),
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!(
                        "attempt timed out after {} ms",
                        policy.attempt_timeout.as_millis()
                    );
                }
            }

            warn!(
                attempt,
                max_attempts = policy.max_attempts,
                error = %last_error,
                "database connectivity attempt failed"
            );
            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.backoff).await;
            }
        }

        self.shutdown().await;
        error!(
            attempts = policy.max_attempts,
            "database unreachable, giving up"
        );
        Err(CatalogError::StartupFailed {
            attempts: policy.max_attempts,
            last_error,
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.read().is_some()
    }

    /// Checks out a connection, waiting up to the acquire timeout.
    pub async fn acquire(&self) -> CatalogResult<PooledConnection> {
        let pool = self
            .pool
            .read()
            .clone()
            .ok_or(CatalogError::PoolUninitialized)?;

        let inner = pool.acquire().await.map_err(|e| self.map_error(e))?;
        Ok(PooledConnection {
            inner,
            discard: false,
        })
    }

    /// Returns a connection to the pool, or closes it if it was marked
    /// broken. Close failures are logged and never surfaced.
    pub async fn release(&self, connection: PooledConnection) {
        let PooledConnection { inner, discard } = connection;
        if !discard {
            drop(inner);
            return;
        }

        let raw = inner.detach();
        // A timed-out statement may still be running; do not make the
        // caller wait for it.
        tokio::spawn(async move {
            if let Err(e) = raw.close().await {
                warn!(error = %e, "failed to close discarded connection");
            } else {
                debug!("discarded connection closed");
            }
        });
    }

    /// Runs `SELECT 1` on a pooled connection.
    pub async fn test_connectivity(&self) -> bool {
        let mut connection = match self.acquire().await {
            Ok(connection) => connection,
            Err(e) => {
                warn!(error = %e, "connectivity check could not acquire a connection");
                return false;
            }
        };

        let result = sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&mut *connection)
            .await;
        if result.is_err() {
            connection.mark_broken();
        }
        self.release(connection).await;

        match result {
            Ok(1) => true,
            Ok(other) => {
                warn!(value = other, "connectivity check returned an unexpected value");
                false
            }
            Err(e) => {
                warn!(error = %e, "connectivity check failed");
                false
            }
        }
    }

    /// Initialized and answering a trivial round-trip.
    pub async fn is_ready(&self) -> bool {
        self.is_initialized() && self.test_connectivity().await
    }

    pub fn status(&self) -> Option<PoolStatus> {
        self.pool.read().as_ref().map(|pool| PoolStatus {
            size: pool.size(),
            idle: pool.num_idle(),
        })
    }

    /// Closes every connection. Later acquires fail with `PoolUninitialized`.
    pub async fn shutdown(&self) {
        let pool = self.pool.write().take();
        if let Some(pool) = pool {
            pool.close().await;
            info!("connection pool closed");
        }
    }

    pub(crate) fn map_error(&self, err: sqlx::Error) -> CatalogError {
        match err {
            sqlx::Error::PoolTimedOut => CatalogError::PoolExhausted {
                timeout_ms: u64::try_from(self.settings.acquire_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            },
            sqlx::Error::PoolClosed => CatalogError::PoolUninitialized,
            other => CatalogError::query_execution(other.to_string()),
        }
    }
}
