//! Folding of flat relational rows into domain values.
//!
//! The single-post query is a `LEFT JOIN` of a post with its comments: one row
//! per comment, or exactly one row with null comment columns when the post has
//! none. [`PostAssembler`] folds those rows into a [`Post`], taking the post
//! columns from the first row only and keeping comment order as delivered.
//!
//! The list query yields one aggregated row per post. [`SummaryCollector`]
//! keeps every row that decodes and skips the ones that do not.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::warn;

use crate::domain::post::{Comment, Post, PostSummary};

/// One row of the post/comments outer join.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct PostCommentRow {
    pub(crate) post_id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) post_created_at: DateTime<Utc>,
    pub(crate) post_updated_at: DateTime<Utc>,
    pub(crate) comment_id: Option<i64>,
    pub(crate) comment_content: Option<String>,
    pub(crate) comment_created_at: Option<DateTime<Utc>>,
}

/// One row of the grouped list query.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct PostSummaryRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) comment_count: i64,
}

impl From<PostSummaryRow> for PostSummary {
    fn from(row: PostSummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            comment_count: row.comment_count,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PostAssembler {
    post: Option<Post>,
}

impl PostAssembler {
    pub(crate) fn push(&mut self, row: PostCommentRow) {
        let PostCommentRow {
            post_id,
            title,
            content,
            post_created_at,
            post_updated_at,
            comment_id,
            comment_content,
            comment_created_at,
        } = row;

        // First row is authoritative for the post columns.
        let post = self.post.get_or_insert_with(|| Post {
            id: post_id,
            title,
            content,
            created_at: post_created_at,
            updated_at: post_updated_at,
            comments: Vec::new(),
        });

        if let (Some(id), Some(content), Some(created_at)) =
            (comment_id, comment_content, comment_created_at)
        {
            post.comments.push(Comment {
                id,
                post_id: post.id,
                content,
                created_at,
            });
        }
    }

    /// `None` when no row was pushed, i.e. the post does not exist.
    pub(crate) fn finish(self) -> Option<Post> {
        self.post
    }
}

#[derive(Debug, Default)]
pub(crate) struct SummaryCollector {
    posts: Vec<PostSummary>,
    skipped: usize,
}

impl SummaryCollector {
    pub(crate) fn accept(&mut self, row: Result<PostSummaryRow, sqlx::Error>) {
        match row {
            Ok(row) => self.posts.push(row.into()),
            Err(err) => {
                self.skipped += 1;
                warn!(error = %err, "skipping post row that failed to decode");
            }
        }
    }

    pub(crate) fn skipped(&self) -> usize {
        self.skipped
    }

    pub(crate) fn finish(self) -> Vec<PostSummary> {
        self.posts
    }
}
