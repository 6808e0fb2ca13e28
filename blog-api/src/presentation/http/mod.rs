pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod middleware;
