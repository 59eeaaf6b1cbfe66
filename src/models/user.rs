//! User, role and activation token models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Role granted to every self-registered account
pub const DEFAULT_ROLE: &str = "USER";

/// User account from database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub firstname: String,
    pub lastname: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    /// Hashed password (argon2)
    pub password: String,
    pub account_locked: bool,
    pub enabled: bool,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    /// Account state check applied at login and on every authenticated request
    pub fn ensure_active(&self) -> Result<(), AppError> {
        if self.account_locked {
            return Err(AppError::Authentication("Account is locked".to_string()));
        }
        if !self.enabled {
            return Err(AppError::Authentication("Account is not activated".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub created_date: DateTime<Utc>,
}

/// Emailed account activation code
#[derive(Debug, Clone, FromRow)]
pub struct Token {
    pub id: i32,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub user_id: i32,
}

impl Token {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegistrationRequest {
    #[validate(length(min = 1, message = "Firstname is mandatory"))]
    pub firstname: String,
    #[validate(length(min = 1, message = "Lastname is mandatory"))]
    pub lastname: String,
    #[validate(email(message = "Email is not well formatted"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password should be 8 characters long minimum"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthenticationRequest {
    #[validate(email(message = "Email is not well formatted"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password should be 8 characters long minimum"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthenticationResponse {
    pub token: String,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User email
    pub sub: String,
    pub user_id: i32,
    pub full_name: String,
    pub authorities: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a JWT token (signature and expiry)
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
