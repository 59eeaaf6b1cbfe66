//! Borrow record (book transaction history) domain methods on Repository

use chrono::Utc;

use super::{is_unique_violation, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        history::{BookTransactionHistory, BorrowedBookRow},
        page::PageRequest,
    },
};

const OPEN_BORROW_INDEX: &str = "uq_history_open_borrow";

const BORROWED_SELECT: &str = r#"
    SELECT b.id AS book_id, b.title, b.author_name, b.isbn,
           (SELECT AVG(f.note) FROM feedback f WHERE f.book_id = b.id) AS rate,
           h.returned, h.returned_approved
    FROM book_transaction_history h
    JOIN books b ON b.id = h.book_id
"#;

pub const ALREADY_BORROWED: &str = "The requested book is already borrowed";

impl Repository {
    /// Whether `user_id` holds a record for the book that the owner has not yet approved back
    pub async fn history_is_already_borrowed_by_user(&self, book_id: i32, user_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM book_transaction_history
                WHERE book_id = $1 AND user_id = $2 AND returned_approved = FALSE
            )
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Open a borrow record. A concurrent duplicate loses on the open-borrow index.
    pub async fn history_create(&self, book_id: i32, user_id: i32) -> AppResult<BookTransactionHistory> {
        sqlx::query_as::<_, BookTransactionHistory>(
            r#"
            INSERT INTO book_transaction_history
                (book_id, user_id, returned, returned_approved, created_date, created_by)
            VALUES ($1, $2, FALSE, FALSE, $3, $2)
            RETURNING id, book_id, user_id, returned, returned_approved, created_date, last_modified_date
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, OPEN_BORROW_INDEX) {
                AppError::NotPermitted(ALREADY_BORROWED.to_string())
            } else {
                AppError::Database(e)
            }
        })
    }

    /// Set `returned` on the borrower's open, not yet returned record. None when there is none.
    pub async fn history_mark_returned(&self, book_id: i32, user_id: i32) -> AppResult<Option<i32>> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE book_transaction_history
            SET returned = TRUE, last_modified_date = $3, last_modified_by = $2
            WHERE book_id = $1 AND user_id = $2
              AND returned = FALSE AND returned_approved = FALSE
            RETURNING id
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    /// Approve the oldest returned, unapproved record of a book owned by `owner_id`
    pub async fn history_approve_return(&self, book_id: i32, owner_id: i32) -> AppResult<Option<i32>> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE book_transaction_history
            SET returned_approved = TRUE, last_modified_date = $3, last_modified_by = $2
            WHERE id = (
                SELECT h.id FROM book_transaction_history h
                JOIN books b ON b.id = h.book_id
                WHERE h.book_id = $1 AND b.owner_id = $2
                  AND h.returned = TRUE AND h.returned_approved = FALSE
                ORDER BY h.created_date
                LIMIT 1
                FOR UPDATE OF h
            )
            RETURNING id
            "#,
        )
        .bind(book_id)
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    /// Records where `user_id` is the borrower, newest first
    pub async fn history_find_borrowed(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowedBookRow>, i64)> {
        let rows = sqlx::query_as::<_, BorrowedBookRow>(&format!(
            "{} WHERE h.user_id = $1 ORDER BY h.created_date DESC, h.id DESC LIMIT $2 OFFSET $3",
            BORROWED_SELECT
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_transaction_history WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Records on books owned by `owner_id`, newest first
    pub async fn history_find_returned(
        &self,
        owner_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowedBookRow>, i64)> {
        let rows = sqlx::query_as::<_, BorrowedBookRow>(&format!(
            "{} WHERE b.owner_id = $1 ORDER BY h.created_date DESC, h.id DESC LIMIT $2 OFFSET $3",
            BORROWED_SELECT
        ))
        .bind(owner_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_transaction_history h
            JOIN books b ON b.id = h.book_id
            WHERE b.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }
}
