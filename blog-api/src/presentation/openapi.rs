use utoipa::OpenApi;

use crate::presentation::http::app_error::ErrorBody;
use crate::presentation::http::handlers::posts::{
    AddCommentDto, AddCommentResponseDto, CommentDto, CreatePostDto, CreatePostResponseDto,
    GetPostResponseDto, ListPostsResponseDto, PostDetailDto, PostSummaryDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::handlers::posts::list_posts,
        crate::presentation::http::handlers::posts::get_post,
        crate::presentation::http::handlers::posts::create_post,
        crate::presentation::http::handlers::posts::add_comment
    ),
    components(
        schemas(
            CreatePostDto,
            AddCommentDto,
            CreatePostResponseDto,
            AddCommentResponseDto,
            PostSummaryDto,
            ListPostsResponseDto,
            CommentDto,
            PostDetailDto,
            GetPostResponseDto,
            ErrorBody
        )
    ),
    tags(
        (name = "posts", description = "Posts and comments")
    )
)]
pub(crate) struct ApiDoc;
