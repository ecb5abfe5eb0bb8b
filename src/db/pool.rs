//! Database connection pool abstraction
//!
//! This module provides a unified interface for database operations that works
//! with both SQLite and MySQL backends. The appropriate pool is created based
//! on the configuration.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions},
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// Acquire timeout for lazily connecting pools. sqlx keeps retrying a
/// refused connection until this expires.
const LAZY_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

/// Database pool trait that abstracts over different database backends.
///
/// This trait provides a unified interface for database operations,
/// allowing the application to work with either SQLite or MySQL
/// without knowing the specific backend.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a raw SQL query that doesn't return rows
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Check if the database connection is healthy
    async fn ping(&self) -> Result<()>;

    /// Close the connection pool
    async fn close(&self);

    /// Get the database driver type
    fn driver(&self) -> DatabaseDriver;

    /// Borrow the driver-specific pool for dispatching queries
    fn backend(&self) -> Backend<'_>;
}

/// Driver-specific pool handle.
///
/// Repositories match on this to pick the SQLite or MySQL query variant.
#[derive(Clone, Copy)]
pub enum Backend<'a> {
    Sqlite(&'a SqlitePool),
    Mysql(&'a MySqlPool),
}

/// SQLite connection pool implementation
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Create a new SQLite connection pool
    pub async fn new(url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir(url)?;

        let pool = sqlite_pool_options(url)
            .connect_with(sqlite_connect_options(url)?)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        Ok(Self { pool })
    }

    /// Create a pool that only connects when first used
    pub fn lazy(url: &str) -> Result<Self> {
        let pool = sqlite_pool_options(url)
            .acquire_timeout(LAZY_ACQUIRE_TIMEOUT)
            .connect_lazy_with(sqlite_connect_options(url)?);
        Ok(Self { pool })
    }
}

fn is_sqlite_memory(url: &str) -> bool {
    url.starts_with(":memory:") || url.starts_with("sqlite::memory:")
}

/// Create the parent directory of a file-based SQLite database
fn ensure_sqlite_parent_dir(url: &str) -> Result<()> {
    if is_sqlite_memory(url) {
        return Ok(());
    }

    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }
    }
    Ok(())
}

fn sqlite_connect_options(url: &str) -> Result<SqliteConnectOptions> {
    let connection_url = if is_sqlite_memory(url) {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite:{}", url)
    };

    let options = SqliteConnectOptions::from_str(&connection_url)
        .with_context(|| format!("Invalid SQLite URL: {}", url))?
        .create_if_missing(true)
        .foreign_keys(true);

    Ok(options)
}

fn sqlite_pool_options(url: &str) -> SqlitePoolOptions {
    // Every connection to `:memory:` opens a separate database
    let max_connections = if is_sqlite_memory(url) { 1 } else { 20 };
    SqlitePoolOptions::new().max_connections(max_connections)
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn backend(&self) -> Backend<'_> {
        Backend::Sqlite(&self.pool)
    }
}

/// MySQL connection pool implementation
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Create a new MySQL connection pool
    pub async fn new(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(30)
            .connect_with(mysql_connect_options(url)?)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self { pool })
    }

    /// Create a pool that only connects when first used
    pub fn lazy(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(30)
            .acquire_timeout(LAZY_ACQUIRE_TIMEOUT)
            .connect_lazy_with(mysql_connect_options(url)?);
        Ok(Self { pool })
    }
}

fn mysql_connect_options(url: &str) -> Result<MySqlConnectOptions> {
    let connection_url = if url.starts_with("mysql://") {
        url.to_string()
    } else {
        format!("mysql://{}", url)
    };

    MySqlConnectOptions::from_str(&connection_url)
        .with_context(|| format!("Invalid MySQL URL: {}", url))
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn backend(&self) -> Backend<'_> {
        Backend::Mysql(&self.pool)
    }
}

/// Type alias for a boxed database pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Create a database connection pool based on configuration.
///
/// Connects eagerly, so an unreachable database is reported here.
///
/// # Example
///
/// ```ignore
/// use student_records::config::DatabaseConfig;
/// use student_records::db::create_pool;
///
/// let config = DatabaseConfig::default();
/// let pool = create_pool(&config).await?;
/// pool.ping().await?;
/// ```
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    match config.driver {
        DatabaseDriver::Sqlite => {
            let db = SqliteDatabase::new(&config.url).await?;
            Ok(Arc::new(db))
        }
        DatabaseDriver::Mysql => {
            let db = MysqlDatabase::new(&config.url).await?;
            Ok(Arc::new(db))
        }
    }
}

/// Create a pool that defers connecting until a query runs.
///
/// Used when the database is unreachable at startup: the process keeps
/// serving and individual requests fail until the store comes back.
/// Only a malformed URL is an error here.
pub fn create_lazy_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    match config.driver {
        DatabaseDriver::Sqlite => Ok(Arc::new(SqliteDatabase::lazy(&config.url)?)),
        DatabaseDriver::Mysql => Ok(Arc::new(MysqlDatabase::lazy(&config.url)?)),
    }
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let config = DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}

/// The SQLite pool behind a test pool, for raw SQL in tests
#[cfg(test)]
pub(crate) fn test_sqlite(pool: &DynDatabasePool) -> &SqlitePool {
    match pool.backend() {
        Backend::Sqlite(pool) => pool,
        Backend::Mysql(_) => panic!("test pools are SQLite"),
    }
}
