use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use service::account::{validation::messages, AccountError, FieldErrors};

/// HTTP-facing error: account failures plus malformed request bodies.
#[derive(Debug)]
pub enum ApiError {
    Account(AccountError),
    BadRequest(String),
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self { ApiError::Account(e) }
}

impl From<FieldErrors> for ApiError {
    fn from(e: FieldErrors) -> Self { ApiError::Account(AccountError::Invalid(e)) }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self { ApiError::BadRequest(e.body_text()) }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Account(e) => match e {
                AccountError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
                AccountError::TokenLimitExceeded => StatusCode::FORBIDDEN,
                AccountError::NotFound(_) => StatusCode::NOT_FOUND,
                AccountError::Conflict(_) => StatusCode::CONFLICT,
                e if e.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = match self {
            ApiError::BadRequest(msg) => {
                return (status, Json(json!({ "detail": msg }))).into_response();
            }
            ApiError::Account(err) => err,
        };

        if let Some(fields) = err.field_errors() {
            return (status, Json(fields)).into_response();
        }
        match err {
            AccountError::Unauthenticated(msg) => {
                (status, [(header::WWW_AUTHENTICATE, "Token")], Json(json!({ "detail": msg }))).into_response()
            }
            AccountError::TokenLimitExceeded => (status, Json(json!({ "detail": messages::TOKEN_LIMIT }))).into_response(),
            AccountError::NotFound(what) => {
                warn!(%what, "not found");
                (status, Json(json!({ "detail": "Not found." }))).into_response()
            }
            AccountError::Conflict(msg) => {
                warn!(error = %msg, "unique constraint rejected write");
                (status, Json(json!({ "detail": "A conflicting record already exists." }))).into_response()
            }
            other => {
                error!(code = other.code(), error = %other, "internal error");
                (status, Json(json!({ "detail": "Internal server error." }))).into_response()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
