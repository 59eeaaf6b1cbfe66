//! Book model, request/response DTOs and the ownership/visibility rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book row joined with its owner name and average feedback note
#[derive(Debug, Clone, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_name: String,
    pub isbn: String,
    pub synopsis: String,
    pub book_cover: Option<String>,
    pub archived: bool,
    pub shareable: bool,
    pub owner_id: i32,
    pub owner_name: String,
    pub rate: Option<f64>,
    pub created_date: DateTime<Utc>,
}

impl Book {
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.owner_id == user_id
    }

    /// Reject unless the caller owns the book
    pub fn ensure_owner(&self, user_id: i32, message: &str) -> AppResult<()> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(AppError::NotPermitted(message.to_string()))
        }
    }

    /// Reject when the caller owns the book
    pub fn ensure_not_owner(&self, user_id: i32, message: &str) -> AppResult<()> {
        if self.is_owned_by(user_id) {
            Err(AppError::NotPermitted(message.to_string()))
        } else {
            Ok(())
        }
    }

    /// Archived or private books take no part in lending or rating
    pub fn ensure_lendable(&self, message: &str) -> AppResult<()> {
        if self.archived || !self.shareable {
            Err(AppError::NotPermitted(message.to_string()))
        } else {
            Ok(())
        }
    }
}

pub const NOT_LENDABLE_BORROW: &str = "You cannot borrow this book since it is archived or not shareable";
pub const OWN_BOOK_BORROW: &str = "You cannot borrow your own book";
pub const NOT_LENDABLE_RETURN: &str = "You cannot return this book since it is archived or not shareable";
pub const OWN_BOOK_RETURN: &str = "You cannot borrow or return your own book";
pub const NOT_OWNER_APPROVE: &str = "You cannot approve the return of a book you do not own";
pub const NOT_LENDABLE_FEEDBACK: &str = "You cannot give feedback for an archived or not shareable book";
pub const OWN_BOOK_FEEDBACK: &str = "You cannot give feedback to your own book";

/// Per-operation guards. Visibility is checked before ownership.
impl Book {
    pub fn ensure_borrowable_by(&self, user_id: i32) -> AppResult<()> {
        self.ensure_lendable(NOT_LENDABLE_BORROW)?;
        self.ensure_not_owner(user_id, OWN_BOOK_BORROW)
    }

    pub fn ensure_returnable_by(&self, user_id: i32) -> AppResult<()> {
        self.ensure_lendable(NOT_LENDABLE_RETURN)?;
        self.ensure_not_owner(user_id, OWN_BOOK_RETURN)
    }

    /// Approval only needs ownership; archived or private books can still be taken back
    pub fn ensure_approvable_by(&self, user_id: i32) -> AppResult<()> {
        self.ensure_owner(user_id, NOT_OWNER_APPROVE)
    }

    pub fn ensure_rateable_by(&self, user_id: i32) -> AppResult<()> {
        self.ensure_lendable(NOT_LENDABLE_FEEDBACK)?;
        self.ensure_not_owner(user_id, OWN_BOOK_FEEDBACK)
    }
}

/// Average feedback note rounded to one decimal, 0 when unrated
pub fn rounded_rate(rate: Option<f64>) -> f64 {
    rate.map(|r| (r * 10.0).round() / 10.0).unwrap_or(0.0)
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(length(min = 1, message = "Title is mandatory"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author name is mandatory"))]
    pub author_name: String,
    #[validate(length(min = 1, message = "ISBN is mandatory"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Synopsis is mandatory"))]
    pub synopsis: String,
    #[serde(default)]
    pub shareable: bool,
}

/// Book as shown to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub author_name: String,
    pub isbn: String,
    pub synopsis: String,
    /// Owner full name
    pub owner: String,
    /// Base64-encoded cover image
    pub cover: Option<String>,
    pub rate: f64,
    pub archived: bool,
    pub shareable: bool,
}

impl BookResponse {
    pub fn from_book(book: Book, cover: Option<String>) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author_name: book.author_name,
            isbn: book.isbn,
            synopsis: book.synopsis,
            owner: book.owner_name,
            cover,
            rate: rounded_rate(book.rate),
            archived: book.archived,
            shareable: book.shareable,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn book(owner_id: i32) -> Book {
        Book {
            id: 1,
            title: "Dune".to_string(),
            author_name: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            synopsis: "Spice".to_string(),
            book_cover: None,
            archived: false,
            shareable: true,
            owner_id,
            owner_name: "Alice Owner".to_string(),
            rate: None,
            created_date: Utc::now(),
        }
    }

    #[test]
    fn test_owner_checks() {
        let b = book(1);
        assert!(b.ensure_owner(1, "no").is_ok());
        assert!(matches!(b.ensure_owner(2, "no"), Err(AppError::NotPermitted(_))));
        assert!(b.ensure_not_owner(2, "no").is_ok());
        assert!(matches!(b.ensure_not_owner(1, "own"), Err(AppError::NotPermitted(_))));
    }

    fn denial(result: AppResult<()>) -> String {
        match result {
            Err(AppError::NotPermitted(message)) => message,
            other => panic!("expected NotPermitted, got {:?}", other),
        }
    }

    #[test]
    fn test_borrow_guard() {
        let mut b = book(1);
        assert!(b.ensure_borrowable_by(2).is_ok());
        assert_eq!(denial(b.ensure_borrowable_by(1)), OWN_BOOK_BORROW);

        b.archived = true;
        assert_eq!(denial(b.ensure_borrowable_by(2)), NOT_LENDABLE_BORROW);
        // Visibility wins over ownership
        assert_eq!(denial(b.ensure_borrowable_by(1)), NOT_LENDABLE_BORROW);

        b.archived = false;
        b.shareable = false;
        assert_eq!(denial(b.ensure_borrowable_by(2)), NOT_LENDABLE_BORROW);
    }

    #[test]
    fn test_return_guard() {
        let mut b = book(1);
        assert!(b.ensure_returnable_by(2).is_ok());
        assert_eq!(denial(b.ensure_returnable_by(1)), OWN_BOOK_RETURN);

        b.archived = true;
        assert_eq!(denial(b.ensure_returnable_by(2)), NOT_LENDABLE_RETURN);
    }

    #[test]
    fn test_approve_guard_ignores_visibility() {
        let mut b = book(1);
        b.archived = true;
        b.shareable = false;
        assert!(b.ensure_approvable_by(1).is_ok());
        assert_eq!(denial(b.ensure_approvable_by(2)), NOT_OWNER_APPROVE);
    }

    #[test]
    fn test_feedback_guard() {
        let mut b = book(1);
        assert!(b.ensure_rateable_by(2).is_ok());
        assert_eq!(denial(b.ensure_rateable_by(1)), OWN_BOOK_FEEDBACK);

        b.shareable = false;
        assert_eq!(denial(b.ensure_rateable_by(2)), NOT_LENDABLE_FEEDBACK);

        b.shareable = true;
        b.archived = true;
        assert_eq!(denial(b.ensure_rateable_by(2)), NOT_LENDABLE_FEEDBACK);
    }

    #[test]
    fn test_archived_or_private_not_lendable() {
        let mut b = book(1);
        assert!(b.ensure_lendable("x").is_ok());

        b.archived = true;
        assert!(b.ensure_lendable("x").is_err());

        b.archived = false;
        b.shareable = false;
        assert!(b.ensure_lendable("x").is_err());
    }

    #[test]
    fn test_rate_rounding() {
        assert_eq!(rounded_rate(None), 0.0);
        assert_eq!(rounded_rate(Some(3.66666)), 3.7);
        assert_eq!(rounded_rate(Some(4.0)), 4.0);
    }

    #[test]
    fn test_response_uses_owner_name() {
        let mut b = book(3);
        b.rate = Some(2.25);
        let response = BookResponse::from_book(b, None);
        assert_eq!(response.owner, "Alice Owner");
        assert_eq!(response.rate, 2.3);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["authorName"], "Frank Herbert");
    }
}
