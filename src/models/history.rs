//! Borrow records (book transaction history)

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::rounded_rate;

/// Custody state of a borrow record, derived from its two flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowStatus {
    Borrowed,
    ReturnRequested,
    ReturnApproved,
}

impl BorrowStatus {
    pub fn from_flags(returned: bool, returned_approved: bool) -> Self {
        match (returned, returned_approved) {
            (_, true) => BorrowStatus::ReturnApproved,
            (true, false) => BorrowStatus::ReturnRequested,
            (false, false) => BorrowStatus::Borrowed,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BookTransactionHistory {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub returned: bool,
    pub returned_approved: bool,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl BookTransactionHistory {
    pub fn status(&self) -> BorrowStatus {
        BorrowStatus::from_flags(self.returned, self.returned_approved)
    }
}

/// History row joined with book columns for listings
#[derive(Debug, Clone, FromRow)]
pub struct BorrowedBookRow {
    pub book_id: i32,
    pub title: String,
    pub author_name: String,
    pub isbn: String,
    pub rate: Option<f64>,
    pub returned: bool,
    pub returned_approved: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBookResponse {
    /// Book ID
    pub id: i32,
    pub title: String,
    pub author_name: String,
    pub isbn: String,
    pub rate: f64,
    pub returned: bool,
    pub return_approved: bool,
    pub status: BorrowStatus,
}

impl From<BorrowedBookRow> for BorrowedBookResponse {
    fn from(row: BorrowedBookRow) -> Self {
        Self {
            id: row.book_id,
            title: row.title,
            author_name: row.author_name,
            isbn: row.isbn,
            rate: rounded_rate(row.rate),
            returned: row.returned,
            return_approved: row.returned_approved,
            status: BorrowStatus::from_flags(row.returned, row.returned_approved),
        }
    }
}
