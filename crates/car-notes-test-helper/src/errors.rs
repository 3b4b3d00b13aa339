use std::collections::BTreeMap;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use car_notes_shared::errors::ErrorBody;

const MSG_UNEXPECTED: &str = "Did not complete action, an unexpected error occured.";

/// Errors are returned in the shape the real server uses, `{"detail": ...}`
/// with either a message or the messages per field
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,
    #[error("Authentication credentials were not provided.")]
    Unauthorized,
    #[error("CSRF Failed: CSRF token missing or incorrect.")]
    CsrfFailed,
    #[error("You do not have permission to perform this action.")]
    PermissionDenied,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid input: {0:?}")]
    Validation(BTreeMap<String, Vec<String>>),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl BackendError {
    pub fn field<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation(BTreeMap::from([(field.into(), vec![message.into()])]))
    }
}

impl From<ErrorBody> for BackendError {
    fn from(value: ErrorBody) -> Self {
        match value {
            ErrorBody::Fields(fields) => Self::Validation(fields),
            ErrorBody::Detail(msg) => Self::BadRequest(msg),
            ErrorBody::Empty => Self::BadRequest("Invalid input.".to_string()),
        }
    }
}

impl ResponseError for BackendError {
    fn status_code(&self) -> StatusCode {
        match self {
            BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
            BackendError::NotAuthenticated
            | BackendError::CsrfFailed
            | BackendError::PermissionDenied => StatusCode::FORBIDDEN,
            BackendError::NotFound(_) => StatusCode::NOT_FOUND,
            BackendError::BadRequest(_) | BackendError::Validation(_) => StatusCode::BAD_REQUEST,
            BackendError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            BackendError::Validation(fields) => serde_json::json!(fields),
            BackendError::Unexpected(e) => {
                tracing::error!(?e, "unexpected error");
                serde_json::json!(MSG_UNEXPECTED)
            }
            other => serde_json::json!(other.to_string()),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "detail": detail }))
    }
}
