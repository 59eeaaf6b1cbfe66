//! Books domain methods on Repository

use chrono::Utc;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{book::{Book, BookRequest}, page::PageRequest},
};

/// Book columns plus owner full name and average feedback note
const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_name, b.isbn, b.synopsis, b.book_cover,
           b.archived, b.shareable, b.owner_id,
           (u.firstname || ' ' || u.lastname) AS owner_name,
           (SELECT AVG(f.note) FROM feedback f WHERE f.book_id = b.id) AS rate,
           b.created_date
    FROM books b
    JOIN users u ON u.id = b.owner_id
"#;

impl Repository {
    /// Insert a book owned by `owner_id`, returning its ID
    pub async fn books_create(&self, request: &BookRequest, owner_id: i32) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (title, author_name, isbn, synopsis, shareable, archived,
                               owner_id, created_date, created_by)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7, $6)
            RETURNING id
            "#,
        )
        .bind(&request.title)
        .bind(&request.author_name)
        .bind(&request.isbn)
        .bind(&request.synopsis)
        .bind(request.shareable)
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Get book by ID
    pub async fn books_get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No book found with ID: {}", id)))
    }

    /// Non-archived books owned by someone other than `user_id`, newest first
    pub async fn books_find_displayable(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<Book>, i64)> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{} WHERE b.archived = FALSE AND b.owner_id <> $1 ORDER BY b.created_date DESC, b.id DESC LIMIT $2 OFFSET $3",
            BOOK_SELECT
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE archived = FALSE AND owner_id <> $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// All books owned by `owner_id`, archived included, newest first
    pub async fn books_find_by_owner(
        &self,
        owner_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<Book>, i64)> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{} WHERE b.owner_id = $1 ORDER BY b.created_date DESC, b.id DESC LIMIT $2 OFFSET $3",
            BOOK_SELECT
        ))
        .bind(owner_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Flip the shareable flag, returning the new value
    pub async fn books_toggle_shareable(&self, id: i32, modified_by: i32) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE books SET shareable = NOT shareable, last_modified_date = $1, last_modified_by = $2
            WHERE id = $3
            RETURNING shareable
            "#,
        )
        .bind(Utc::now())
        .bind(modified_by)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No book found with ID: {}", id)))
    }

    /// Flip the archived flag, returning the new value
    pub async fn books_toggle_archived(&self, id: i32, modified_by: i32) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE books SET archived = NOT archived, last_modified_date = $1, last_modified_by = $2
            WHERE id = $3
            RETURNING archived
            "#,
        )
        .bind(Utc::now())
        .bind(modified_by)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No book found with ID: {}", id)))
    }

    pub async fn books_set_cover(&self, id: i32, path: &str, modified_by: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE books SET book_cover = $1, last_modified_date = $2, last_modified_by = $3 WHERE id = $4",
        )
        .bind(path)
        .bind(Utc::now())
        .bind(modified_by)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("No book found with ID: {}", id)));
        }
        Ok(())
    }
}
