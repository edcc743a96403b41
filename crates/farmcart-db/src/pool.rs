//! # Connection Pool
//!
//! Opens the order history database and hands out repositories.
//!
//! ```text
//! CartConfig::database_path ──► DbConfig ──► Database::new ──► SqlitePool
//!                                                  │
//!                                                  ├─ journal_mode = WAL (files)
//!                                                  ├─ foreign_keys = ON
//!                                                  └─ embedded migrations
//!
//! Database::orders() ──► OrderRepository (shares the pool)
//! ```
//!
//! History lookups come from many buyer sessions at once while orders are
//! imported in the background. WAL lets those reads proceed during a write.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::order::OrderRepository;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// How to open the order history database.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/farmcart/farmcart.db").pool_size(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open. `:memory:` for a throwaway database.
    pub path: PathBuf,

    /// Upper bound on open connections. Default: 5
    pub pool_size: u32,

    /// How long a query waits for a free connection. Default: 10 seconds
    pub acquire_timeout: Duration,

    /// Idle connections are closed after this long. Default: 5 minutes
    pub idle_timeout: Duration,

    /// Apply pending migrations when opening. Default: true
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: path.into(),
            pool_size: 5,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(300),
            migrate: true,
        }
    }

    /// A private database that lives as long as the pool. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig::new(MEMORY_PATH)
    }

    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size.max(1);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Opens the database as is, without touching the schema.
    pub fn skip_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == Path::new(MEMORY_PATH)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the order history database. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database and brings its schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.path.display(), "Opening order history database");

        let (connect_options, pool_options) = if config.is_in_memory() {
            // Each in-memory connection is its own database, and dropping the
            // last one discards it: keep exactly one, forever.
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::Connection(e.to_string()))?;
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
            (options, pool)
        } else {
            let options = SqliteConnectOptions::new()
                .filename(&config.path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal);
            let pool = SqlitePoolOptions::new()
                .max_connections(config.pool_size)
                .idle_timeout(config.idle_timeout);
            (options, pool)
        };

        let connect_options = connect_options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = pool_options
            .acquire_timeout(config.acquire_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        debug!(pool_size = config.pool_size, "Order history pool ready");

        let db = Database { pool };
        if config.migrate {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Already-applied ones are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!("Closing order history database");
        self.pool.close().await;
    }

    /// `true` if a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.orders().count().await.unwrap(), 0);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert!(total >= 1);
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_rerunning_migrations_is_harmless() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.run_migrations().await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_skip_migrations_leaves_schema_empty() {
        let db = Database::new(DbConfig::in_memory().skip_migrations())
            .await
            .unwrap();

        assert!(db.health_check().await);
        assert!(db.orders().count().await.is_err());
    }

    #[tokio::test]
    async fn test_closed_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config() {
        let config = DbConfig::new("/tmp/farmcart-test.db")
            .pool_size(0)
            .acquire_timeout(Duration::from_secs(1));

        assert_eq!(config.pool_size, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(1));
        assert!(config.migrate);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
