use std::time::Duration;

use axum::{BoxError, Router, error_handling::HandleErrorLayer};
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::timeout::error::Elapsed;
use tower_http::limit::RequestBodyLimitLayer;

use crate::infrastructure::settings::Settings;
use crate::presentation::http::app_error::AppError;

/// Request timeout, a process-wide in-flight cap and a body size cap.
/// A timed-out request drops its handler future, which cancels any query it
/// was awaiting.
pub(crate) fn apply_limits(router: Router, settings: &Settings) -> Router {
    router
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_limit_error))
                .timeout(Duration::from_secs(settings.http_request_timeout_secs))
                .layer(GlobalConcurrencyLimitLayer::new(
                    settings.http_concurrency_limit,
                )),
        )
        .layer(RequestBodyLimitLayer::new(
            settings.http_request_body_limit_bytes,
        ))
}

async fn handle_limit_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::RequestTimeout
    } else {
        AppError::Middleware(err)
    }
}
