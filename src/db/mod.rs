//! Database layer
//!
//! SQLite (default, file created on demand) and MySQL are both supported
//! behind the `DatabasePool` trait; the driver is chosen by configuration.
//!
//! ```ignore
//! use student_records::config::DatabaseConfig;
//! use student_records::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_lazy_pool, create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};

#[cfg(test)]
pub(crate) use pool::test_sqlite;
