//! Authentication endpoints (public)

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{AuthenticationRequest, AuthenticationResponse, RegistrationRequest},
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivationQuery {
    /// Activation code received by email
    pub token: String,
}

/// Register a new account; an activation code is emailed
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegistrationRequest,
    responses(
        (status = 202, description = "Account created, activation pending"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> AppResult<StatusCode> {
    request.validate()?;

    state.services.auth.register(request).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Activate an account with its emailed code
#[utoipa::path(
    get,
    path = "/auth/activate-account",
    tag = "auth",
    params(ActivationQuery),
    responses(
        (status = 200, description = "Account activated"),
        (status = 400, description = "Code expired (a new one was sent) or already used"),
        (status = 404, description = "Unknown code")
    )
)]
pub async fn activate_account(
    State(state): State<AppState>,
    Query(query): Query<ActivationQuery>,
) -> AppResult<StatusCode> {
    state.services.auth.activate_account(&query.token).await?;
    Ok(StatusCode::OK)
}

/// Log in and receive a bearer token
#[utoipa::path(
    post,
    path = "/auth/authenticate",
    tag = "auth",
    request_body = AuthenticationRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthenticationResponse),
        (status = 401, description = "Bad credentials, or account disabled or locked")
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    Json(request): Json<AuthenticationRequest>,
) -> AppResult<Json<AuthenticationResponse>> {
    request.validate()?;

    let response = state.services.auth.authenticate(request).await?;
    Ok(Json(response))
}
