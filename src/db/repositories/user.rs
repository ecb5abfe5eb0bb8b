//! User repository
//!
//! Database operations for user accounts (the credential store).
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL
//!
//! Username and email uniqueness is enforced by the schema; a lost race
//! surfaces from `create`/`update_profile` as a unique violation that callers
//! detect with [`super::is_unique_violation`].

use crate::db::{Backend, DynDatabasePool};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Find any user holding this username or this email
    async fn find_by_username_or_email(&self, username: &str, email: &str)
        -> Result<Option<User>>;

    /// Find a user other than `exclude_id` holding this email
    async fn find_by_email_excluding(&self, email: &str, exclude_id: i64) -> Result<Option<User>>;

    /// Update email and full name, refreshing `updated_at`.
    ///
    /// Returns `None` when the user does not exist.
    async fn update_profile(&self, id: i64, email: &str, full_name: &str) -> Result<Option<User>>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_user_sqlite(pool, user).await,
            Backend::Mysql(pool) => create_user_mysql(pool, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("{} WHERE id = ?", SELECT_USER);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get user by ID")?;
                row.as_ref().map(row_to_user_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get user by ID")?;
                row.as_ref().map(row_to_user_mysql).transpose()
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("{} WHERE username = ?", SELECT_USER);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(username)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get user by username")?;
                row.as_ref().map(row_to_user_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(username)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get user by username")?;
                row.as_ref().map(row_to_user_mysql).transpose()
            }
        }
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let sql = format!("{} WHERE username = ? OR email = ? LIMIT 1", SELECT_USER);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(username)
                    .bind(email)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to look up user by username or email")?;
                row.as_ref().map(row_to_user_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(username)
                    .bind(email)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to look up user by username or email")?;
                row.as_ref().map(row_to_user_mysql).transpose()
            }
        }
    }

    async fn find_by_email_excluding(&self, email: &str, exclude_id: i64) -> Result<Option<User>> {
        let sql = format!("{} WHERE email = ? AND id <> ? LIMIT 1", SELECT_USER);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .bind(exclude_id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to look up user by email")?;
                row.as_ref().map(row_to_user_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .bind(exclude_id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to look up user by email")?;
                row.as_ref().map(row_to_user_mysql).transpose()
            }
        }
    }

    async fn update_profile(&self, id: i64, email: &str, full_name: &str) -> Result<Option<User>> {
        let now = Utc::now();
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(UPDATE_PROFILE)
                .bind(email)
                .bind(full_name)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to update user profile")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(UPDATE_PROFILE)
                .bind(email)
                .bind(full_name)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to update user profile")?
                .rows_affected(),
        };

        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }
}

const SELECT_USER: &str = r#"
    SELECT id, username, email, full_name, password_hash, created_at, updated_at
    FROM users
"#;

const UPDATE_PROFILE: &str = r#"
    UPDATE users
    SET email = ?, full_name = ?, updated_at = ?
    WHERE id = ?
"#;

const INSERT_USER: &str = r#"
    INSERT INTO users (username, email, full_name, password_hash, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_USER)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_USER)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// User store whose duplicate lookups always miss.
///
/// Stands in for a concurrent writer that lands between a service's
/// pre-check and its write, so only the UNIQUE constraint catches it.
#[cfg(test)]
pub(crate) struct BlindLookupUserRepository {
    inner: SqlxUserRepository,
}

#[cfg(test)]
impl BlindLookupUserRepository {
    pub(crate) fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self {
            inner: SqlxUserRepository::new(pool),
        })
    }
}

#[cfg(test)]
#[async_trait]
impl UserRepository for BlindLookupUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        self.inner.create(user).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.get_by_username(username).await
    }

    async fn find_by_username_or_email(&self, _: &str, _: &str) -> Result<Option<User>> {
        Ok(None)
    }

    async fn find_by_email_excluding(&self, _: &str, _: i64) -> Result<Option<User>> {
        Ok(None)
    }

    async fn update_profile(&self, id: i64, email: &str, full_name: &str) -> Result<Option<User>> {
        self.inner.update_profile(id, email, full_name).await
    }
}
