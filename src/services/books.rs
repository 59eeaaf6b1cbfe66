//! Book listing, visibility rules and the borrow / return / approve workflow

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookRequest, BookResponse},
        history::BorrowedBookResponse,
        page::{PageRequest, PageResponse},
    },
    repository::{history::ALREADY_BORROWED, Repository},
};

use super::storage::FileStorageService;

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    storage: FileStorageService,
}

impl BooksService {
    pub fn new(repository: Repository, storage: FileStorageService) -> Self {
        Self { repository, storage }
    }

    /// Create a book owned by `user_id`
    pub async fn save(&self, request: BookRequest, user_id: i32) -> AppResult<i32> {
        let id = self.repository.books_create(&request, user_id).await?;
        tracing::info!("User {} created book {}", user_id, id);
        Ok(id)
    }

    pub async fn find_by_id(&self, book_id: i32) -> AppResult<BookResponse> {
        let book = self.repository.books_get_by_id(book_id).await?;
        Ok(self.to_response(book).await)
    }

    /// Feed of other users' books, archived ones excluded
    pub async fn find_all_books(&self, page: PageRequest, user_id: i32) -> AppResult<PageResponse<BookResponse>> {
        let (books, total) = self.repository.books_find_displayable(user_id, page).await?;
        self.to_page(books, page, total).await
    }

    pub async fn find_all_books_by_owner(&self, page: PageRequest, user_id: i32) -> AppResult<PageResponse<BookResponse>> {
        let (books, total) = self.repository.books_find_by_owner(user_id, page).await?;
        self.to_page(books, page, total).await
    }

    pub async fn find_all_borrowed_books(
        &self,
        page: PageRequest,
        user_id: i32,
    ) -> AppResult<PageResponse<BorrowedBookResponse>> {
        let (rows, total) = self.repository.history_find_borrowed(user_id, page).await?;
        Ok(PageResponse::new(rows, page, total).map(BorrowedBookResponse::from))
    }

    pub async fn find_all_returned_books(
        &self,
        page: PageRequest,
        user_id: i32,
    ) -> AppResult<PageResponse<BorrowedBookResponse>> {
        let (rows, total) = self.repository.history_find_returned(user_id, page).await?;
        Ok(PageResponse::new(rows, page, total).map(BorrowedBookResponse::from))
    }

    pub async fn update_shareable_status(&self, book_id: i32, user_id: i32) -> AppResult<i32> {
        let book = self.repository.books_get_by_id(book_id).await?;
        book.ensure_owner(user_id, "You cannot update others books shareable status")?;

        let shareable = self.repository.books_toggle_shareable(book_id, user_id).await?;
        tracing::debug!("Book {} shareable = {}", book_id, shareable);
        Ok(book_id)
    }

    pub async fn update_archived_status(&self, book_id: i32, user_id: i32) -> AppResult<i32> {
        let book = self.repository.books_get_by_id(book_id).await?;
        book.ensure_owner(user_id, "You cannot update others books archived status")?;

        let archived = self.repository.books_toggle_archived(book_id, user_id).await?;
        tracing::debug!("Book {} archived = {}", book_id, archived);
        Ok(book_id)
    }

    /// Open a borrow record for `user_id`, returning the record ID
    pub async fn borrow_book(&self, book_id: i32, user_id: i32) -> AppResult<i32> {
        let book = self.repository.books_get_by_id(book_id).await?;
        book.ensure_borrowable_by(user_id)?;

        if self
            .repository
            .history_is_already_borrowed_by_user(book_id, user_id)
            .await?
        {
            return Err(AppError::NotPermitted(ALREADY_BORROWED.to_string()));
        }

        let record = self.repository.history_create(book_id, user_id).await?;
        tracing::info!(
            "User {} borrowed book {} (record {}, {:?})",
            user_id,
            book_id,
            record.id,
            record.status()
        );
        Ok(record.id)
    }

    /// Borrower hands the book back; the owner still has to approve
    pub async fn return_borrowed_book(&self, book_id: i32, user_id: i32) -> AppResult<i32> {
        let book = self.repository.books_get_by_id(book_id).await?;
        book.ensure_returnable_by(user_id)?;

        let record_id = self
            .repository
            .history_mark_returned(book_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotPermitted("You did not borrow this book".to_string()))?;

        tracing::info!("User {} returned book {} (record {})", user_id, book_id, record_id);
        Ok(record_id)
    }

    /// Owner confirms a returned book is back
    pub async fn approve_return_borrowed_book(&self, book_id: i32, user_id: i32) -> AppResult<i32> {
        let book = self.repository.books_get_by_id(book_id).await?;
        book.ensure_approvable_by(user_id)?;

        let record_id = self
            .repository
            .history_approve_return(book_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotPermitted("The book is not returned yet. You cannot approve its return".to_string())
            })?;

        tracing::info!("Owner {} approved return of book {} (record {})", user_id, book_id, record_id);
        Ok(record_id)
    }

    /// Store a cover image for a book owned by `user_id`
    pub async fn upload_book_cover(
        &self,
        book_id: i32,
        content: &[u8],
        file_name: Option<&str>,
        user_id: i32,
    ) -> AppResult<()> {
        let book = self.repository.books_get_by_id(book_id).await?;
        book.ensure_owner(user_id, "You cannot change the cover of others books")?;

        let path = self.storage.save_file(content, file_name, user_id).await?;
        self.repository.books_set_cover(book_id, &path, user_id).await
    }

    async fn to_response(&self, book: Book) -> BookResponse {
        let cover = self.storage.read_file_base64(book.book_cover.as_deref()).await;
        BookResponse::from_book(book, cover)
    }

    async fn to_page(&self, books: Vec<Book>, page: PageRequest, total: i64) -> AppResult<PageResponse<BookResponse>> {
        let mut content = Vec::with_capacity(books.len());
        for book in books {
            content.push(self.to_response(book).await);
        }
        Ok(PageResponse::new(content, page, total))
    }
}
