use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostSummary};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) content: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NewComment {
    pub(crate) post_id: i64,
    pub(crate) content: String,
}

/// Data access for posts and their comments.
///
/// Implementations only ever fail with [`DomainError::NotFound`] or
/// [`DomainError::Internal`], and perform no input validation.
#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    /// Posts newest first, each with its comment count. Rows that fail to
    /// decode are skipped.
    async fn list_posts_with_comment_counts(&self) -> Result<Vec<PostSummary>, DomainError>;
    /// A post with its comments, newest first, or `NotFound`.
    async fn get_post_with_comments(&self, post_id: i64) -> Result<Post, DomainError>;
    async fn create_post(&self, input: NewPost) -> Result<i64, DomainError>;
    /// A missing parent post is rejected by the store and reported as `Internal`.
    async fn add_comment(&self, input: NewComment) -> Result<i64, DomainError>;
}

pub(crate) type DynPostRepository = Arc<dyn PostRepository>;

#[async_trait]
impl<R: PostRepository + ?Sized> PostRepository for Arc<R> {
    async fn list_posts_with_comment_counts(&self) -> Result<Vec<PostSummary>, DomainError> {
        (**self).list_posts_with_comment_counts().await
    }

    async fn get_post_with_comments(&self, post_id: i64) -> Result<Post, DomainError> {
        (**self).get_post_with_comments(post_id).await
    }

    async fn create_post(&self, input: NewPost) -> Result<i64, DomainError> {
        (**self).create_post(input).await
    }

    async fn add_comment(&self, input: NewComment) -> Result<i64, DomainError> {
        (**self).add_comment(input).await
    }
}
