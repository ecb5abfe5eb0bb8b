//! Student repository
//!
//! Database operations for student records.
//!
//! This module provides:
//! - `StudentRepository` trait defining the interface for record access
//! - `SqlxStudentRepository` implementing the trait for SQLite and MySQL
//!
//! Registration numbers are unique at the schema level. `create` and
//! `update` do not pre-check; a duplicate comes back as a unique violation.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Student, StudentFields};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Student repository trait
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Insert a record owned by `created_by`
    async fn create(&self, fields: &StudentFields, created_by: Option<i64>) -> Result<Student>;

    /// Get a record by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Student>>;

    /// All records, newest first
    async fn list(&self) -> Result<Vec<Student>>;

    /// Replace the business fields of a record and refresh `updated_at`.
    ///
    /// Returns `None` when the record does not exist.
    async fn update(&self, id: i64, fields: &StudentFields) -> Result<Option<Student>>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based student repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxStudentRepository {
    pool: DynDatabasePool,
}

impl SqlxStudentRepository {
    /// Create a new SQLx student repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn StudentRepository> {
        Arc::new(Self::new(pool))
    }
}

const STUDENT_COLUMNS: &str = "id, name, registration_number, email, phone, address, created_by, created_at, updated_at";

const INSERT_STUDENT: &str = r#"
    INSERT INTO students (name, registration_number, email, phone, address, created_by, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_STUDENT: &str = r#"
    UPDATE students
    SET name = ?, registration_number = ?, email = ?, phone = ?, address = ?, updated_at = ?
    WHERE id = ?
"#;

#[async_trait]
impl StudentRepository for SqlxStudentRepository {
    async fn create(&self, fields: &StudentFields, created_by: Option<i64>) -> Result<Student> {
        let now = Utc::now();

        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(INSERT_STUDENT)
                .bind(&fields.name)
                .bind(&fields.registration_number)
                .bind(&fields.email)
                .bind(&fields.phone)
                .bind(&fields.address)
                .bind(created_by)
                .bind(now)
                .bind(now)
                .execute(pool)
                .await
                .context("Failed to create student")?
                .last_insert_rowid(),
            Backend::Mysql(pool) => sqlx::query(INSERT_STUDENT)
                .bind(&fields.name)
                .bind(&fields.registration_number)
                .bind(&fields.email)
                .bind(&fields.phone)
                .bind(&fields.address)
                .bind(created_by)
                .bind(now)
                .bind(now)
                .execute(pool)
                .await
                .context("Failed to create student")?
                .last_insert_id() as i64,
        };

        Ok(Student {
            id,
            name: fields.name.clone(),
            registration_number: fields.registration_number.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            address: fields.address.clone(),
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Student>> {
        let sql = format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get student by ID")?;
                row.as_ref().map(row_to_student_sqlite).transpose()
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get student by ID")?;
                row.as_ref().map(row_to_student_mysql).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Student>> {
        let sql = format!(
            "SELECT {} FROM students ORDER BY created_at DESC, id DESC",
            STUDENT_COLUMNS
        );
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list students")?;
                rows.iter().map(row_to_student_sqlite).collect()
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list students")?;
                rows.iter().map(row_to_student_mysql).collect()
            }
        }
    }

    async fn update(&self, id: i64, fields: &StudentFields) -> Result<Option<Student>> {
        let now = Utc::now();

        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(UPDATE_STUDENT)
                .bind(&fields.name)
                .bind(&fields.registration_number)
                .bind(&fields.email)
                .bind(&fields.phone)
                .bind(&fields.address)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to update student")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(UPDATE_STUDENT)
                .bind(&fields.name)
                .bind(&fields.registration_number)
                .bind(&fields.email)
                .bind(&fields.phone)
                .bind(&fields.address)
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to update student")?
                .rows_affected(),
        };

        // updated_at always changes, so MySQL counts an existing row as affected
        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query("DELETE FROM students WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete student")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query("DELETE FROM students WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete student")?
                .rows_affected(),
        };

        Ok(affected > 0)
    }
}

fn row_to_student_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Student> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        registration_number: row.try_get("registration_number")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_student_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Student> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        registration_number: row.try_get("registration_number")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
