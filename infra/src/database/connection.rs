//! MySQL pool for the credit ledger and the verification store
//!
//! Wraps the SQLx pool with the settings from [`DatabaseConfig`], a ping used
//! by `/health`, and the schema migrations embedded from `infra/migrations`.

use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    ConnectOptions, MySqlPool,
};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::log::LevelFilter;

use sv_shared::config::DatabaseConfig;

use crate::InfrastructureError;

/// Shared SQLx pool plus the configuration it was opened with
#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
    config: DatabaseConfig,
}

impl DatabasePool {
    /// Open the pool
    ///
    /// Statements are logged at debug level; anything slower than
    /// `slow_query_threshold` milliseconds is logged as a warning.
    ///
    /// ```no_run
    /// use sv_infra::database::DatabasePool;
    /// use sv_shared::config::DatabaseConfig;
    ///
    /// # async fn open() -> Result<(), sv_infra::InfrastructureError> {
    /// let pool = DatabasePool::new(DatabaseConfig::mysql("mysql://sv:sv@localhost/smsverify")).await?;
    /// pool.run_migrations().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(config: DatabaseConfig) -> Result<Self, InfrastructureError> {
        let connect_options = MySqlConnectOptions::from_str(&config.url)
            .map_err(|e| InfrastructureError::Config(format!("Invalid database URL: {}", e)))?
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(
                LevelFilter::Warn,
                Duration::from_millis(config.slow_query_threshold),
            );

        tracing::info!(
            max_connections = config.max_connections,
            remote = config.is_remote(),
            "Opening database pool"
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to open database pool");
                InfrastructureError::Database(e)
            })?;

        Ok(Self { pool, config })
    }

    /// Wrap an already connected pool
    pub fn from_pool(pool: MySqlPool, config: DatabaseConfig) -> Self {
        Self { pool, config }
    }

    pub fn get_pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Round-trip a `SELECT 1`, returning how long it took
    pub async fn ping(&self) -> Result<Duration, InfrastructureError> {
        let started = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(|e| {
            tracing::warn!(error = %e, "Database ping failed");
            InfrastructureError::Database(e)
        })?;

        let latency = started.elapsed();
        tracing::debug!(latency_ms = latency.as_millis() as u64, "Database ping");
        Ok(latency)
    }

    pub fn statistics(&self) -> PoolStatistics {
        PoolStatistics {
            connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
            max_connections: self.pool.options().get_max_connections(),
        }
    }

    /// Close every connection; called once at shutdown
    pub async fn close(&self) {
        tracing::info!(stats = %self.statistics(), "Closing database pool");
        self.pool.close().await;
    }

    /// Apply pending migrations from `infra/migrations`
    ///
    /// Already applied migrations are skipped, so this is safe on every boot.
    pub async fn run_migrations(&self) -> Result<(), InfrastructureError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database schema up to date");
        Ok(())
    }
}

/// Snapshot of pool usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatistics {
    pub connections: u32,
    pub idle_connections: usize,
    pub max_connections: u32,
}

impl PoolStatistics {
    /// Connections currently checked out
    pub fn in_use(&self) -> u32 {
        self.connections.saturating_sub(self.idle_connections as u32)
    }

    /// Whether every permitted connection is checked out
    pub fn is_saturated(&self) -> bool {
        self.in_use() >= self.max_connections
    }
}

impl fmt::Display for PoolStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in use, {} idle, max {}",
            self.in_use(),
            self.idle_connections,
            self.max_connections
        )
    }
}
