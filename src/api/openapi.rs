//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, feedbacks, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshare API",
        version = "1.0.0",
        description = "Book lending social network REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::activate_account,
        auth::authenticate,
        // Books
        books::save_book,
        books::find_book_by_id,
        books::find_all_books,
        books::find_all_books_by_owner,
        books::find_all_borrowed_books,
        books::find_all_returned_books,
        books::update_shareable_status,
        books::update_archived_status,
        books::upload_book_cover,
        // Borrowing
        books::borrow_book,
        books::return_borrowed_book,
        books::approve_return_borrowed_book,
        // Feedback
        feedbacks::save_feedback,
        feedbacks::find_all_feedback_by_book,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::RegistrationRequest,
            crate::models::user::AuthenticationRequest,
            crate::models::user::AuthenticationResponse,
            // Books
            crate::models::book::BookRequest,
            crate::models::book::BookResponse,
            crate::models::history::BorrowedBookResponse,
            crate::models::history::BorrowStatus,
            books::CoverUpload,
            // Feedback
            crate::models::feedback::FeedbackRequest,
            crate::models::feedback::FeedbackResponse,
            // Pages
            crate::models::page::BookPage,
            crate::models::page::BorrowedBookPage,
            crate::models::page::FeedbackPage,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, activation and login"),
        (name = "books", description = "Book management"),
        (name = "borrowing", description = "Borrow, return and approval workflow"),
        (name = "feedbacks", description = "Ratings and comments")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
