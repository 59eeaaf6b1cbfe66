//! Registration, account activation and login

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::Rng;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        AuthenticationRequest, AuthenticationResponse, RegistrationRequest, User, UserClaims,
        DEFAULT_ROLE,
    },
    repository::Repository,
};

use super::email::EmailService;

const ACTIVATION_CODE_LENGTH: usize = 6;

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    email: EmailService,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig, email: EmailService) -> Self {
        Self { repository, config, email }
    }

    /// Create a disabled account and email its activation code
    pub async fn register(&self, request: RegistrationRequest) -> AppResult<()> {
        if self.repository.users_email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let role = self
            .repository
            .roles_get_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Role {} was not initialized", DEFAULT_ROLE)))?;

        let password_hash = hash_password(&request.password)?;
        let user = self
            .repository
            .users_create(&request, &password_hash, &role)
            .await?;

        tracing::info!("Registered user {} ({})", user.id, user.email);

        self.send_validation_email(&user).await
    }

    /// Enable the account owning `token`; an expired code is replaced and re-sent
    pub async fn activate_account(&self, token: &str) -> AppResult<()> {
        let saved = self.repository.tokens_get_by_token(token).await?;

        if saved.validated_at.is_some() {
            return Err(AppError::BadRequest("Activation token has already been used".to_string()));
        }

        if saved.is_expired(Utc::now()) {
            let user = self.repository.users_get_by_id(saved.user_id).await?;
            self.send_validation_email(&user).await?;
            return Err(AppError::BadRequest(
                "Activation token has expired. A new token has been sent to the same email address"
                    .to_string(),
            ));
        }

        self.repository.users_activate(saved.user_id, saved.id).await?;

        tracing::info!("Activated user {}", saved.user_id);
        Ok(())
    }

    /// Check credentials and issue a JWT
    pub async fn authenticate(&self, request: AuthenticationRequest) -> AppResult<AuthenticationResponse> {
        let user = self
            .repository
            .users_get_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Login and / or password is incorrect".to_string()))?;

        if !verify_password(&user, &request.password)? {
            return Err(AppError::Authentication("Login and / or password is incorrect".to_string()));
        }

        user.ensure_active()?;

        let token = self.create_token_for_user(&user).await?;
        Ok(AuthenticationResponse { token })
    }

    /// Verify a bearer token and that its user may still use the API
    pub async fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let user = self
            .repository
            .users_find_by_id(claims.user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User no longer exists".to_string()))?;
        user.ensure_active()?;

        Ok(claims)
    }

    async fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let authorities = self.repository.users_get_authorities(user.id).await?;

        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            full_name: user.full_name(),
            authorities,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Store a fresh code and try to mail it; only storage errors propagate
    async fn send_validation_email(&self, user: &User) -> AppResult<()> {
        let code = self.generate_and_save_activation_token(user).await?;
        self.email
            .notify_activation_code(&user.email, &user.full_name(), &code)
            .await;
        Ok(())
    }

    async fn generate_and_save_activation_token(&self, user: &User) -> AppResult<String> {
        let mut code = generate_activation_code(ACTIVATION_CODE_LENGTH);
        while self.repository.tokens_exists(&code).await? {
            code = generate_activation_code(ACTIVATION_CODE_LENGTH);
        }

        let expires_at = Utc::now() + Duration::minutes(self.config.activation_code_ttl_minutes);
        self.repository.tokens_create(user.id, &code, expires_at).await?;
        Ok(code)
    }
}

/// Random numeric code of `length` digits
pub fn generate_activation_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        User {
            id: 1,
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            date_of_birth: None,
            email: "ada@example.com".to_string(),
            password: hash_password(password).unwrap(),
            account_locked: false,
            enabled: true,
            created_date: Utc::now(),
            last_modified_date: None,
        }
    }

    #[test]
    fn test_activation_code_shape() {
        for _ in 0..50 {
            let code = generate_activation_code(ACTIVATION_CODE_LENGTH);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_password_verification() {
        let user = user_with_password("correct horse");
        assert!(verify_password(&user, "correct horse").unwrap());
        assert!(!verify_password(&user, "battery staple").unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }
}
