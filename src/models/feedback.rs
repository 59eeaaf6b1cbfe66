//! Feedback (rating and comment) on a book

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, FromRow)]
pub struct Feedback {
    pub id: i32,
    pub note: f64,
    pub comment: String,
    pub book_id: i32,
    pub created_by: i32,
    pub created_date: DateTime<Utc>,
}

/// Create feedback request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    /// Rating from 1 to 5
    #[validate(range(min = 1.0, max = 5.0, message = "Note must be between 1 and 5"))]
    pub note: f64,
    #[validate(length(min = 1, message = "Comment is mandatory"))]
    pub comment: String,
    pub book_id: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub note: f64,
    pub comment: String,
    /// True when the caller wrote this feedback
    pub own_feedback: bool,
}

impl FeedbackResponse {
    pub fn for_viewer(feedback: Feedback, user_id: i32) -> Self {
        Self {
            note: feedback.note,
            comment: feedback.comment,
            own_feedback: feedback.created_by == user_id,
        }
    }
}
