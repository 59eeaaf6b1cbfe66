//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{BookRequest, BookResponse},
        page::{BookPage, BorrowedBookPage, PageQuery, PageResponse},
        history::BorrowedBookResponse,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Multipart body for cover upload
#[derive(Deserialize, ToSchema)]
pub struct CoverUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Add a book to the caller's shelf
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created, returns its ID", body = i32),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn save_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BookRequest>,
) -> AppResult<(StatusCode, Json<i32>)> {
    request.validate()?;

    let id = state.services.books.save(request, claims.user_id).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn find_book_by_id(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.books.find_by_id(id).await?;
    Ok(Json(book))
}

/// Books of other users that are not archived
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of books", body = BookPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn find_all_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PageResponse<BookResponse>>> {
    let page = query.validate()?;
    let books = state.services.books.find_all_books(page, claims.user_id).await?;
    Ok(Json(books))
}

/// Books owned by the caller
#[utoipa::path(
    get,
    path = "/books/owner",
    tag = "books",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of the caller's books", body = BookPage)
    )
)]
pub async fn find_all_books_by_owner(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PageResponse<BookResponse>>> {
    let page = query.validate()?;
    let books = state.services.books.find_all_books_by_owner(page, claims.user_id).await?;
    Ok(Json(books))
}

/// Borrow records where the caller is the borrower
#[utoipa::path(
    get,
    path = "/books/borrowed",
    tag = "books",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of borrowed books", body = BorrowedBookPage)
    )
)]
pub async fn find_all_borrowed_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PageResponse<BorrowedBookResponse>>> {
    let page = query.validate()?;
    let books = state.services.books.find_all_borrowed_books(page, claims.user_id).await?;
    Ok(Json(books))
}

/// Borrow records on books the caller owns
#[utoipa::path(
    get,
    path = "/books/returned",
    tag = "books",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of lent books", body = BorrowedBookPage)
    )
)]
pub async fn find_all_returned_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PageResponse<BorrowedBookResponse>>> {
    let page = query.validate()?;
    let books = state.services.books.find_all_returned_books(page, claims.user_id).await?;
    Ok(Json(books))
}

/// Toggle the shareable flag (owner only)
#[utoipa::path(
    patch,
    path = "/books/sharable/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Flag toggled, returns the book ID", body = i32),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_shareable_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<i32>> {
    let id = state.services.books.update_shareable_status(id, claims.user_id).await?;
    Ok(Json(id))
}

/// Toggle the archived flag (owner only)
#[utoipa::path(
    patch,
    path = "/books/archived/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Flag toggled, returns the book ID", body = i32),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_archived_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<i32>> {
    let id = state.services.books.update_archived_status(id, claims.user_id).await?;
    Ok(Json(id))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/books/borrow/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Borrow record ID", body = i32),
        (status = 403, description = "Own, archived, private or already borrowed book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<i32>> {
    let record_id = state.services.books.borrow_book(id, claims.user_id).await?;
    Ok(Json(record_id))
}

/// Return a borrowed book
#[utoipa::path(
    patch,
    path = "/books/borrow/return/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Borrow record ID", body = i32),
        (status = 403, description = "Book not borrowed by the caller"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn return_borrowed_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<i32>> {
    let record_id = state.services.books.return_borrowed_book(id, claims.user_id).await?;
    Ok(Json(record_id))
}

/// Approve the return of a lent book (owner only)
#[utoipa::path(
    patch,
    path = "/books/borrow/return/approve/{id}",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Borrow record ID", body = i32),
        (status = 403, description = "Not the owner, or book not returned yet"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn approve_return_borrowed_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<i32>> {
    let record_id = state
        .services
        .books
        .approve_return_borrowed_book(id, claims.user_id)
        .await?;
    Ok(Json(record_id))
}

/// Upload a cover image (multipart field `file`, owner only)
#[utoipa::path(
    post,
    path = "/books/cover/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body(content = CoverUpload, content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Cover stored"),
        (status = 400, description = "Missing file field"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn upload_book_cover(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> AppResult<StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;

        state
            .services
            .books
            .upload_book_cover(id, &content, file_name.as_deref(), claims.user_id)
            .await?;
        return Ok(StatusCode::ACCEPTED);
    }

    Err(AppError::BadRequest("Missing multipart field 'file'".to_string()))
}
