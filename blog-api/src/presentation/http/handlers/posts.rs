use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::post::{AddCommentRequest, Comment, CreatePostRequest, Post, PostSummary};
use crate::presentation::AppState;
use crate::presentation::http::app_error::{AppResult, ErrorBody};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "post title cannot be empty"))]
    pub(crate) title: String,
    #[serde(default, rename = "post_content")]
    #[validate(length(min = 1, message = "post content cannot be empty"))]
    pub(crate) content: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct AddCommentDto {
    #[serde(default, rename = "comment_content")]
    #[validate(length(min = 1, message = "comment content cannot be empty"))]
    pub(crate) content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CreatePostResponseDto {
    pub(crate) post_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AddCommentResponseDto {
    pub(crate) comment_id: i64,
}

/// Timestamps are RFC3339 strings, e.g. `2025-10-21T12:00:00Z`.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostSummaryDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) comment_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostSummaryDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) content: String,
    pub(crate) created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDetailDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) comments: Vec<CommentDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct GetPostResponseDto {
    pub(crate) post: PostDetailDto,
}

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<PostSummary> for PostSummaryDto {
    fn from(post: PostSummary) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            created_at: rfc3339(post.created_at),
            updated_at: rfc3339(post.updated_at),
            comment_count: post.comment_count,
        }
    }
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            created_at: rfc3339(comment.created_at),
        }
    }
}

impl From<Post> for PostDetailDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            created_at: rfc3339(post.created_at),
            updated_at: rfc3339(post.updated_at),
            comments: post.comments.into_iter().map(CommentDto::from).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    responses(
        (status = 200, description = "Posts listed, newest first", body = ListPostsResponseDto),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<ListPostsResponseDto>)> {
    let posts = state.blog_service.list_posts().await?;

    Ok((
        StatusCode::OK,
        Json(ListPostsResponseDto {
            posts: posts.into_iter().map(PostSummaryDto::from).collect(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post with its comments", body = GetPostResponseDto),
        (status = 400, description = "Invalid post id", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<(StatusCode, Json<GetPostResponseDto>)> {
    let Path(id) = id?;
    let post = state.blog_service.get_post(id).await?;

    Ok((
        StatusCode::OK,
        Json(GetPostResponseDto {
            post: PostDetailDto::from(post),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body(
        content = CreatePostDto,
        description = "Title and content must not be blank; whitespace-only values are rejected"
    ),
    responses(
        (status = 201, description = "Post created", body = CreatePostResponseDto),
        (status = 400, description = "Malformed json or validation error", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreatePostDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CreatePostResponseDto>)> {
    let Json(dto) = payload?;
    dto.validate()?;
    let req = CreatePostRequest {
        title: dto.title,
        content: dto.content,
    };

    let post_id = state.blog_service.create_post(req).await?;
    Ok((StatusCode::CREATED, Json(CreatePostResponseDto { post_id })))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body(
        content = AddCommentDto,
        description = "Comment content must not be blank; whitespace-only values are rejected"
    ),
    responses(
        (status = 201, description = "Comment added", body = AddCommentResponseDto),
        (status = 400, description = "Malformed json, invalid post id or validation error", body = ErrorBody),
        (status = 500, description = "Internal error, including a missing post", body = ErrorBody)
    )
)]
pub(crate) async fn add_comment(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AddCommentDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AddCommentResponseDto>)> {
    let Json(dto) = payload?;
    let Path(post_id) = id?;
    dto.validate()?;
    let req = AddCommentRequest {
        content: dto.content,
    };

    let comment_id = state.blog_service.add_comment(post_id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddCommentResponseDto { comment_id }),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::application::blog_service::BlogService;
    use crate::data::post_repository::{NewComment, NewPost, PostRepository};
    use crate::domain::error::DomainError;
    use crate::domain::post::{Comment, Post, PostSummary};
    use crate::presentation::{AppState, routes};

    #[derive(Default)]
    struct InMemoryRepo {
        posts: Mutex<Vec<Post>>,
        broken: bool,
    }

    impl InMemoryRepo {
        fn broken() -> Self {
            Self {
                posts: Mutex::new(Vec::new()),
                broken: true,
            }
        }

        fn check(&self) -> Result<(), DomainError> {
            if self.broken {
                return Err(DomainError::Internal(
                    "connection refused: password authentication failed for user \"blog\""
                        .to_string(),
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PostRepository for InMemoryRepo {
        async fn list_posts_with_comment_counts(&self) -> Result<Vec<PostSummary>, DomainError> {
            self.check()?;
            let posts = self.posts.lock().expect("posts mutex poisoned");
            Ok(posts
                .iter()
                .rev()
                .map(|post| PostSummary {
                    id: post.id,
                    title: post.title.clone(),
                    content: post.content.clone(),
                    created_at: post.created_at,
                    updated_at: post.updated_at,
                    comment_count: post.comments.len() as i64,
                })
                .collect())
        }

        async fn get_post_with_comments(&self, post_id: i64) -> Result<Post, DomainError> {
            self.check()?;
            let posts = self.posts.lock().expect("posts mutex poisoned");
            let mut post = posts
                .iter()
                .find(|post| post.id == post_id)
                .cloned()
                .ok_or_else(|| DomainError::NotFound(format!("post id: {post_id}")))?;
            post.comments.reverse();
            Ok(post)
        }

        async fn create_post(&self, input: NewPost) -> Result<i64, DomainError> {
            self.check()?;
            let mut posts = self.posts.lock().expect("posts mutex poisoned");
            let id = posts.len() as i64 + 1;
            let at = Utc
                .with_ymd_and_hms(2025, 10, 21, 12, 0, id as u32)
                .single()
                .expect("valid ts");
            posts.push(Post {
                id,
                title: input.title,
                content: input.content,
                created_at: at,
                updated_at: at,
                comments: Vec::new(),
            });
            Ok(id)
        }

        async fn add_comment(&self, input: NewComment) -> Result<i64, DomainError> {
            self.check()?;
            let mut posts = self.posts.lock().expect("posts mutex poisoned");
            let next_id = posts.iter().map(|p| p.comments.len() as i64).sum::<i64>() + 1;
            let post = posts
                .iter_mut()
                .find(|post| post.id == input.post_id)
                .ok_or_else(|| DomainError::Internal("foreign key violation".to_string()))?;
            post.comments.push(Comment {
                id: next_id,
                post_id: input.post_id,
                content: input.content,
                created_at: post.created_at,
            });
            Ok(next_id)
        }
    }

    fn app(repo: InMemoryRepo) -> Router {
        let repo: Arc<dyn PostRepository> = Arc::new(repo);
        let state = AppState::new(Arc::new(BlogService::new(repo)));
        routes::router(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header(header::CONTENT_TYPE, "application/json");
        }
        let request = request
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .expect("request must build");

        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body must be readable");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn create_then_get_round_trips_with_empty_comments() {
        let app = app(InMemoryRepo::default());

        let (status, body) = send(
            &app,
            "POST",
            "/api/posts",
            Some(r#"{"title":"T","post_content":"C"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"post_id": 1}));

        let (status, body) = send(&app, "GET", "/api/posts/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["post"]["id"], 1);
        assert_eq!(body["post"]["title"], "T");
        assert_eq!(body["post"]["content"], "C");
        assert_eq!(body["post"]["created_at"], "2025-10-21T12:00:01Z");
        assert_eq!(body["post"]["comments"], json!([]));
    }

    #[tokio::test]
    async fn comments_are_returned_with_rfc3339_timestamps() {
        let app = app(InMemoryRepo::default());
        send(
            &app,
            "POST",
            "/api/posts",
            Some(r#"{"title":"T","post_content":"C"}"#),
        )
        .await;

        for content in ["first", "second"] {
            let (status, _) = send(
                &app,
                "POST",
                "/api/posts/1/comments",
                Some(&json!({ "comment_content": content }).to_string()),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = send(&app, "GET", "/api/posts/1", None).await;
        let comments = body["post"]["comments"].as_array().expect("comments array");
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0]["content"], "second");
        assert_eq!(comments[0]["created_at"], "2025-10-21T12:00:01Z");

        let (status, body) = send(&app, "GET", "/api/posts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"][0]["comment_count"], 2);
        assert_eq!(body["posts"][0]["updated_at"], "2025-10-21T12:00:01Z");
        assert!(body["posts"][0].get("comments").is_none());
    }

    #[tokio::test]
    async fn empty_title_is_rejected_with_message() {
        let app = app(InMemoryRepo::default());

        let (status, body) = send(
            &app,
            "POST",
            "/api/posts",
            Some(r#"{"title":"","post_content":"C"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "invalid request input: post title cannot be empty"
        );
    }

    #[tokio::test]
    async fn whitespace_only_title_is_rejected_and_nothing_is_stored() {
        let app = app(InMemoryRepo::default());

        let (status, body) = send(
            &app,
            "POST",
            "/api/posts",
            Some(r#"{"title":"   ","post_content":"C"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "invalid request input: post title cannot be empty"
        );

        let (_, body) = send(&app, "GET", "/api/posts", None).await;
        assert_eq!(body["posts"], json!([]));
    }

    #[tokio::test]
    async fn missing_comment_field_is_a_validation_error() {
        let app = app(InMemoryRepo::default());
        send(
            &app,
            "POST",
            "/api/posts",
            Some(r#"{"title":"T","post_content":"C"}"#),
        )
        .await;

        let (status, body) = send(&app, "POST", "/api/posts/1/comments", Some("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "invalid request input: comment content cannot be empty"
        );
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let app = app(InMemoryRepo::default());

        let (status, body) = send(&app, "POST", "/api/posts", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "malformed json");
    }

    #[tokio::test]
    async fn non_numeric_id_is_rejected() {
        let app = app(InMemoryRepo::default());

        let (status, body) = send(&app, "GET", "/api/posts/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid post id");

        let (status, body) = send(
            &app,
            "POST",
            "/api/posts/abc/comments",
            Some(r#"{"comment_content":"x"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid post id");
    }

    #[tokio::test]
    async fn missing_post_is_404() {
        let app = app(InMemoryRepo::default());

        let (status, body) = send(&app, "GET", "/api/posts/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "resource not found: post id: 99");
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_500() {
        let app = app(InMemoryRepo::default());

        let (status, body) = send(
            &app,
            "POST",
            "/api/posts/99/comments",
            Some(r#"{"comment_content":"x"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let app = app(InMemoryRepo::broken());

        let (status, body) = send(&app, "GET", "/api/posts", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "internal server error"}));
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let app = app(InMemoryRepo::default());

        let (status, body) = send(&app, "GET", "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
