use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use microblog_types::api::{ErrorBody, FieldError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected input, reported per field (400)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Policy rejection such as following or messaging yourself (403)
    #[error("{0}")]
    Forbidden(String),

    /// Reset token was malformed, forged or expired. The cause is not exposed.
    #[error("Token is incorrect!")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<microblog_auth::AuthError> for ApiError {
    fn from(err: microblog_auth::AuthError) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            Self::InvalidToken => (StatusCode::BAD_REQUEST, "invalid_token"),
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let fields = match self {
            Self::Validation(fields) => fields,
            _ => Vec::new(),
        };

        let body = ErrorBody {
            error: kind.to_string(),
            message,
            fields,
        };
        (status, Json(body)).into_response()
    }
}
