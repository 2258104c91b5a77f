//! Error taxonomy of the accounts service and its HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::repo::StoreError;

#[derive(Error, Debug)]
pub enum AuthError {
    // Signup input
    #[error("An account with this email already exists")]
    DuplicateAccount,

    #[error("Password must be at least 6 characters")]
    WeakPassword,

    #[error("Name must be at least 2 characters")]
    InvalidName,

    #[error("Invalid email address")]
    InvalidEmail,

    // Login credentials
    #[error("No account found with this email address")]
    AccountNotFound,

    #[error("Wrong password. Please try again.")]
    WrongPassword,

    // Token and identity. Never split further.
    #[error("Invalid authentication credentials")]
    Unauthorized,

    #[error("Federated authentication not yet implemented")]
    NotImplemented,

    // Body could not be read as the expected JSON
    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },

    #[error("Internal server error")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::DuplicateAccount => "DUPLICATE_ACCOUNT",
            AuthError::WeakPassword => "WEAK_PASSWORD",
            AuthError::InvalidName => "INVALID_NAME",
            AuthError::InvalidEmail => "INVALID_EMAIL",
            AuthError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            AuthError::WrongPassword => "WRONG_PASSWORD",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::NotImplemented => "NOT_IMPLEMENTED",
            AuthError::InvalidRequest { .. } => "INVALID_REQUEST",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::DuplicateAccount | AuthError::WeakPassword | AuthError::InvalidName => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidEmail => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::AccountNotFound | AuthError::WrongPassword | AuthError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            AuthError::InvalidRequest { status, .. } => *status,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AuthError::Internal(msg.into())
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AuthError::DuplicateAccount,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(ref msg) = self {
            tracing::error!(error = %msg, "internal error");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
