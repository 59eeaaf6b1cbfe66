//! Users and roles domain methods on Repository

use chrono::Utc;

use super::{is_unique_violation, Repository};
use crate::{
    error::{AppError, AppResult},
    models::user::{RegistrationRequest, Role, User},
};

impl Repository {
    /// Get user by ID
    pub async fn users_get_by_id(&self, id: i32) -> AppResult<User> {
        self.users_find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn users_find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, firstname, lastname, date_of_birth, email, password,
                   account_locked, enabled, created_date, last_modified_date
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Get user by email (login identity, case-insensitive)
    pub async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, firstname, lastname, date_of_birth, email, password,
                   account_locked, enabled, created_date, last_modified_date
            FROM users WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn users_email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a disabled account and grant it `role` in one transaction
    pub async fn users_create(
        &self,
        request: &RegistrationRequest,
        password_hash: &str,
        role: &Role,
    ) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (firstname, lastname, email, password, account_locked, enabled, created_date)
            VALUES ($1, $2, $3, $4, FALSE, FALSE, $5)
            RETURNING id, firstname, lastname, date_of_birth, email, password,
                      account_locked, enabled, created_date, last_modified_date
            "#,
        )
        .bind(&request.firstname)
        .bind(&request.lastname)
        .bind(&request.email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "users_email_key") {
                AppError::Conflict("Email is already registered".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user.id)
            .bind(role.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Enable the account and consume its activation token in one transaction.
    /// Fails with BadRequest when the token was consumed concurrently.
    pub async fn users_activate(&self, user_id: i32, token_id: i32) -> AppResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query(
            "UPDATE tokens SET validated_at = $1 WHERE id = $2 AND validated_at IS NULL",
        )
        .bind(now)
        .bind(token_id)
        .execute(&mut *tx)
        .await?;
        if consumed.rows_affected() == 0 {
            return Err(AppError::BadRequest("Activation token has already been used".to_string()));
        }

        let enabled = sqlx::query(
            "UPDATE users SET enabled = TRUE, last_modified_date = $1 WHERE id = $2",
        )
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        if enabled.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Role names granted to a user
    pub async fn users_get_authorities(&self, user_id: i32) -> AppResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    pub async fn roles_get_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name, created_date FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }
}
