//! Data models for the book network

pub mod book;
pub mod feedback;
pub mod history;
pub mod page;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookRequest, BookResponse};
pub use feedback::{Feedback, FeedbackRequest, FeedbackResponse};
pub use history::{BookTransactionHistory, BorrowStatus, BorrowedBookResponse};
pub use page::{PageQuery, PageRequest, PageResponse};
pub use user::{Role, Token, User, UserClaims};
