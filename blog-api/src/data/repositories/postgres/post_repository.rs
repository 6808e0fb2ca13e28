use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{FromRow, PgPool};
use tracing::{error, info, warn};

use crate::data::post_repository::{NewComment, NewPost, PostRepository};
use crate::data::row_mapper::{PostAssembler, PostCommentRow, PostSummaryRow, SummaryCollector};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostSummary};

const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Bounds `op` by the query timeout. On expiry the future is dropped, which
    /// abandons the query and hands the connection back to the pool.
    async fn with_deadline<T, F>(&self, operation: &'static str, op: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        match tokio::time::timeout(self.query_timeout, op).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    operation,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "query deadline elapsed"
                );
                Err(DomainError::Internal(format!(
                    "{operation}: query deadline elapsed"
                )))
            }
        }
    }

    async fn fetch_summaries(&self) -> Result<Vec<PostSummary>, DomainError> {
        let mut rows = sqlx::query(
            r#"
            SELECT
                b.id,
                b.title,
                b.content,
                b.created_at,
                b.updated_at,
                COUNT(c.id) AS comment_count
            FROM blog_posts b
            LEFT JOIN comments c ON c.blog_post_id = b.id
            GROUP BY b.id
            ORDER BY b.created_at DESC, b.id DESC
            "#,
        )
        .fetch(&self.pool);

        let mut collector = SummaryCollector::default();
        while let Some(row) = rows.try_next().await.map_err(|err| {
            error!(error = %err, "failed to read posts");
            DomainError::internal("list posts", err)
        })? {
            collector.accept(PostSummaryRow::from_row(&row));
        }

        if collector.skipped() > 0 {
            warn!(
                skipped = collector.skipped(),
                "listed posts with undecodable rows skipped"
            );
        }
        Ok(collector.finish())
    }

    async fn fetch_post(&self, post_id: i64) -> Result<Post, DomainError> {
        let mut rows = sqlx::query(
            r#"
            SELECT
                b.id AS post_id,
                b.title,
                b.content,
                b.created_at AS post_created_at,
                b.updated_at AS post_updated_at,
                c.id AS comment_id,
                c.content AS comment_content,
                c.created_at AS comment_created_at
            FROM blog_posts b
            LEFT JOIN comments c ON c.blog_post_id = b.id
            WHERE b.id = $1
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(post_id)
        .fetch(&self.pool);

        let mut assembler = PostAssembler::default();
        while let Some(row) = rows.try_next().await.map_err(|err| {
            error!(post_id, error = %err, "failed to read post");
            DomainError::internal("get post", err)
        })? {
            let row = PostCommentRow::from_row(&row).map_err(|err| {
                error!(post_id, error = %err, "failed to decode post row");
                DomainError::internal("decode post row", err)
            })?;
            assembler.push(row);
        }

        assembler.finish().ok_or_else(|| {
            info!(post_id, "post not found");
            DomainError::NotFound(format!("post id: {post_id}"))
        })
    }

    async fn insert_post(&self, input: NewPost) -> Result<i64, DomainError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO blog_posts (title, content)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            error!(post_title = %input.title, error = %err, "could not persist the post");
            DomainError::internal("create post", err)
        })?;

        info!(post_id = id, "post created");
        Ok(id)
    }

    async fn insert_comment(&self, input: NewComment) -> Result<i64, DomainError> {
        let post_id = input.post_id;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO comments (blog_post_id, content)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(post_id)
        .bind(&input.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                warn!(post_id, error = %err, "comment rejected: post does not exist");
            } else {
                error!(post_id, error = %err, "could not add the comment");
            }
            DomainError::internal("add comment", err)
        })?;

        info!(post_id, comment_id = id, "comment added");
        Ok(id)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_posts_with_comment_counts(&self) -> Result<Vec<PostSummary>, DomainError> {
        self.with_deadline("list_posts_with_comment_counts", self.fetch_summaries())
            .await
    }

    async fn get_post_with_comments(&self, post_id: i64) -> Result<Post, DomainError> {
        self.with_deadline("get_post_with_comments", self.fetch_post(post_id))
            .await
    }

    async fn create_post(&self, input: NewPost) -> Result<i64, DomainError> {
        self.with_deadline("create_post", self.insert_post(input))
            .await
    }

    async fn add_comment(&self, input: NewComment) -> Result<i64, DomainError> {
        self.with_deadline("add_comment", self.insert_comment(input))
            .await
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    )
}
