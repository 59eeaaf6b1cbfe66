//! Pagination request parameters and the page envelope returned by list endpoints

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `page` / `size` query parameters (zero-based page index)
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 0
    #[serde(alias = "pageNo")]
    pub page: Option<i64>,
    /// Page size (default 10, max 100)
    #[serde(alias = "pageSize")]
    pub size: Option<i64>,
}

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageQuery {
    pub fn validate(self) -> AppResult<PageRequest> {
        let page = self.page.unwrap_or(0);
        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 0 {
            return Err(AppError::Validation("Page index must not be negative".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(AppError::Validation(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if page.checked_mul(size).is_none() {
            return Err(AppError::Validation("Page index is out of range".to_string()));
        }

        Ok(PageRequest { page, size })
    }
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }

    pub fn limit(&self) -> i64 {
        self.size
    }
}

/// Uniform page envelope
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(
    BookPage = PageResponse<crate::models::book::BookResponse>,
    BorrowedBookPage = PageResponse<crate::models::history::BorrowedBookResponse>,
    FeedbackPage = PageResponse<crate::models::feedback::FeedbackResponse>
)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page_number: i64,
    pub page_size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub is_first: bool,
    pub is_last: bool,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let total_pages = (total_elements + request.size - 1) / request.size;

        Self {
            content,
            page_number: request.page,
            page_size: request.size,
            total_elements,
            total_pages,
            is_first: request.page == 0,
            is_last: request.page.saturating_add(1) >= total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            is_first: self.is_first,
            is_last: self.is_last,
        }
    }
}
