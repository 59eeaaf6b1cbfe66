//! Business logic services

pub mod auth;
pub mod books;
pub mod email;
pub mod feedbacks;
pub mod storage;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub feedbacks: feedbacks::FeedbacksService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let email = email::EmailService::new(config.email.clone());
        let storage = storage::FileStorageService::new(config.storage.clone());

        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone(), email),
            books: books::BooksService::new(repository.clone(), storage),
            feedbacks: feedbacks::FeedbacksService::new(repository.clone()),
            repository,
        }
    }
}
