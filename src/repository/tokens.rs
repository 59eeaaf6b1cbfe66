//! Activation token domain methods on Repository

use chrono::{DateTime, Utc};

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::user::Token,
};

impl Repository {
    pub async fn tokens_create(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Token> {
        let row = sqlx::query_as::<_, Token>(
            r#"
            INSERT INTO tokens (token, created_at, expires_at, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(Utc::now())
        .bind(expires_at)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn tokens_get_by_token(&self, token: &str) -> AppResult<Token> {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid activation token".to_string()))
    }

    pub async fn tokens_exists(&self, token: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tokens WHERE token = $1)")
            .bind(token)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
