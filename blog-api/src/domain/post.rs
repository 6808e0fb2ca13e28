use chrono::{DateTime, Utc};

use super::error::DomainError;

/// A post together with its comments, newest comment first.
#[derive(Debug, Clone)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) post_id: i64,
    pub(crate) content: String,
    pub(crate) created_at: DateTime<Utc>,
}

/// List projection of a post: no comment bodies, only their number.
#[derive(Debug, Clone)]
pub(crate) struct PostSummary {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) comment_count: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        if is_blank(&self.content) {
            return Err(DomainError::invalid_input("post content cannot be empty"));
        }
        if is_blank(&self.title) {
            return Err(DomainError::invalid_input("post title cannot be empty"));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AddCommentRequest {
    pub(crate) content: String,
}

impl AddCommentRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        if is_blank(&self.content) {
            return Err(DomainError::invalid_input("comment content cannot be empty"));
        }
        Ok(self)
    }
}

// Blank input is rejected, accepted input is stored untouched.
fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
