//! Feedback on books

use crate::{
    error::AppResult,
    models::{
        feedback::{FeedbackRequest, FeedbackResponse},
        page::{PageRequest, PageResponse},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct FeedbacksService {
    repository: Repository,
}

impl FeedbacksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn save(&self, request: FeedbackRequest, user_id: i32) -> AppResult<i32> {
        let book = self.repository.books_get_by_id(request.book_id).await?;
        book.ensure_rateable_by(user_id)?;

        self.repository.feedbacks_create(&request, user_id).await
    }

    pub async fn find_all_feedback_by_book(
        &self,
        book_id: i32,
        page: PageRequest,
        user_id: i32,
    ) -> AppResult<PageResponse<FeedbackResponse>> {
        // Verify book exists
        self.repository.books_get_by_id(book_id).await?;
        let (feedbacks, total) = self.repository.feedbacks_find_by_book(book_id, page).await?;
        Ok(PageResponse::new(feedbacks, page, total)
            .map(|feedback| FeedbackResponse::for_viewer(feedback, user_id)))
    }
}
