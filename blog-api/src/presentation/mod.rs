use std::sync::Arc;

use crate::application::blog_service::BlogService;
use crate::data::post_repository::DynPostRepository;

pub(crate) mod http;
pub(crate) mod openapi;
pub(crate) mod routes;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) blog_service: Arc<BlogService<DynPostRepository>>,
}

impl AppState {
    pub(crate) fn new(blog_service: Arc<BlogService<DynPostRepository>>) -> Self {
        Self { blog_service }
    }
}
