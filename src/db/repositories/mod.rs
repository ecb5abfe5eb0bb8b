//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod session;
pub mod student;
pub mod user;

pub use session::{SessionRepository, SqlxSessionRepository};
pub use student::{SqlxStudentRepository, StudentRepository};
pub use user::{SqlxUserRepository, UserRepository};

#[cfg(test)]
pub(crate) use user::BlindLookupUserRepository;

/// Whether a repository error was caused by a UNIQUE constraint.
///
/// Repositories wrap driver errors with `.context(..)`, so the whole chain
/// is searched for the underlying `sqlx::Error`.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_plain_error_is_not_unique_violation() {
        let err = anyhow::anyhow!("UNIQUE constraint failed: users.username");
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn test_non_database_sqlx_error_is_not_unique_violation() {
        let err = Err::<(), _>(sqlx::Error::RowNotFound)
            .context("Failed to create user")
            .unwrap_err();
        assert!(!is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_detects_wrapped_unique_violation() {
        let pool = crate::db::create_test_pool().await.unwrap();
        pool.execute("CREATE TABLE t (v TEXT UNIQUE)").await.unwrap();
        pool.execute("INSERT INTO t (v) VALUES ('a')").await.unwrap();

        let err = pool
            .execute("INSERT INTO t (v) VALUES ('a')")
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }
}
