//! Feedback domain methods on Repository

use chrono::Utc;

use super::Repository;
use crate::{
    error::AppResult,
    models::{feedback::{Feedback, FeedbackRequest}, page::PageRequest},
};

impl Repository {
    pub async fn feedbacks_create(&self, request: &FeedbackRequest, user_id: i32) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO feedback (note, comment, book_id, created_date, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(request.note)
        .bind(&request.comment)
        .bind(request.book_id)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Feedback for a book, newest first
    pub async fn feedbacks_find_by_book(
        &self,
        book_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<Feedback>, i64)> {
        let rows = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, note, comment, book_id, created_by, created_date
            FROM feedback
            WHERE book_id = $1
            ORDER BY created_date DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(book_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total))
    }
}
