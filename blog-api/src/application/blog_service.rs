use crate::data::post_repository::{NewComment, NewPost, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{AddCommentRequest, CreatePostRequest, Post, PostSummary};

pub(crate) struct BlogService<R: PostRepository> {
    repo: R,
}

impl<R: PostRepository> BlogService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    pub(crate) async fn create_post(&self, req: CreatePostRequest) -> Result<i64, DomainError> {
        let req = req.validate()?;

        let new_post = NewPost {
            title: req.title,
            content: req.content,
        };
        self.repo.create_post(new_post).await
    }

    pub(crate) async fn add_comment(
        &self,
        post_id: i64,
        req: AddCommentRequest,
    ) -> Result<i64, DomainError> {
        let req = req.validate()?;

        let new_comment = NewComment {
            post_id,
            content: req.content,
        };
        self.repo.add_comment(new_comment).await
    }

    pub(crate) async fn get_post(&self, post_id: i64) -> Result<Post, DomainError> {
        self.repo.get_post_with_comments(post_id).await
    }

    pub(crate) async fn list_posts(&self) -> Result<Vec<PostSummary>, DomainError> {
        self.repo.list_posts_with_comment_counts().await
    }
}
