//! API handlers and router for the REST endpoints

pub mod auth;
pub mod books;
pub mod feedbacks;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

const MAX_COVER_SIZE: usize = 10 * 1024 * 1024;

/// Identity of the caller, placed in request extensions by [`require_authentication`]
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserClaims>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))
    }
}

/// Bearer token gate in front of every protected route.
///
/// Rejects with 401 when the header is missing or malformed, the token is invalid or
/// expired, or the account behind it is gone, disabled or locked.
pub async fn require_authentication(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(|| {
        AppError::Authentication("Missing or malformed authorization header".to_string())
    })?;

    let claims = state.services.auth.verify_token(bearer.token()).await.map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        e
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/activate-account", get(auth::activate_account))
        .route("/auth/authenticate", post(auth::authenticate));

    let protected = Router::new()
        // Books
        .route("/books", post(books::save_book).get(books::find_all_books))
        .route("/books/owner", get(books::find_all_books_by_owner))
        .route("/books/borrowed", get(books::find_all_borrowed_books))
        .route("/books/returned", get(books::find_all_returned_books))
        .route("/books/:id", get(books::find_book_by_id))
        .route("/books/sharable/:id", patch(books::update_shareable_status))
        .route("/books/archived/:id", patch(books::update_archived_status))
        .route("/books/borrow/:id", post(books::borrow_book))
        .route("/books/borrow/return/:id", patch(books::return_borrowed_book))
        .route("/books/borrow/return/approve/:id", patch(books::approve_return_borrowed_book))
        .route(
            "/books/cover/:id",
            post(books::upload_book_cover).layer(DefaultBodyLimit::max(MAX_COVER_SIZE)),
        )
        // Feedback
        .route("/feedbacks", post(feedbacks::save_feedback))
        .route("/feedbacks/book/:id", get(feedbacks::find_all_feedback_by_book))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_authentication));

    let api_v1 = public.merge(protected).with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
