//! Feedback endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        feedback::{FeedbackRequest, FeedbackResponse},
        page::{FeedbackPage, PageQuery, PageResponse},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Rate and comment a book
#[utoipa::path(
    post,
    path = "/feedbacks",
    tag = "feedbacks",
    security(("bearer_auth" = [])),
    request_body = FeedbackRequest,
    responses(
        (status = 201, description = "Feedback created, returns its ID", body = i32),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Own, archived or private book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn save_feedback(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<(StatusCode, Json<i32>)> {
    request.validate()?;

    let id = state.services.feedbacks.save(request, claims.user_id).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// Feedback left on a book
#[utoipa::path(
    get,
    path = "/feedbacks/book/{id}",
    tag = "feedbacks",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of feedback", body = FeedbackPage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn find_all_feedback_by_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PageResponse<FeedbackResponse>>> {
    let page = query.validate()?;
    let feedbacks = state
        .services
        .feedbacks
        .find_all_feedback_by_book(book_id, page, claims.user_id)
        .await?;
    Ok(Json(feedbacks))
}
