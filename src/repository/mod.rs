//! Repository layer for database operations
//!
//! Domain methods are implemented on [`Repository`] in one file per table group
//! and prefixed with the table they work on (`books_`, `history_`, ...).

pub mod books;
pub mod feedbacks;
pub mod history;
pub mod tokens;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Postgres error code for unique constraint violations
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

/// Main repository struct holding the database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// True when the error is a unique constraint violation on `constraint`
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
