use axum::{Router, routing::get};

use super::AppState;
use super::http::handlers::health::healthz;

pub(crate) mod posts;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/posts", posts::router())
        .with_state(state)
}
