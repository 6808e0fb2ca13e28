use axum::{
    BoxError, Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::domain::error::DomainError;

pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("malformed json: {0}")]
    MalformedJson(#[from] JsonRejection),

    #[error("invalid post id: {0}")]
    InvalidPostId(#[from] PathRejection),

    #[error("request timed out")]
    RequestTimeout,

    #[error("middleware failure: {0}")]
    Middleware(BoxError),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}

/// Maps a domain error to the status and the message a client may see.
/// Internal details never leave this function; they belong in the log.
pub(crate) fn classify(err: &DomainError) -> (StatusCode, String) {
    match err {
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::InvalidInput(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_ERROR_MESSAGE.to_string(),
        ),
    }
}

// Fields are visited in name order so the reported message is stable.
fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|err| err.message.as_ref().map(|message| message.to_string()))
        .unwrap_or_else(|| "request validation failed".to_string())
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Domain(err) => classify(err),
            AppError::Validation(errs) => {
                classify(&DomainError::invalid_input(validation_message(errs)))
            }
            AppError::MalformedJson(_) => (StatusCode::BAD_REQUEST, "malformed json".to_string()),
            AppError::InvalidPostId(_) => (StatusCode::BAD_REQUEST, "invalid post id".to_string()),
            AppError::RequestTimeout => {
                (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
            }
            AppError::Middleware(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = self.status_and_message();

        if status.is_server_error() {
            error!(http_status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(http_status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(ErrorBody { error: msg })).into_response()
    }
}
