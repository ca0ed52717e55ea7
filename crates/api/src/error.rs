//! Application error handling.
//!
//! Every handler returns [`AppError`]; its `IntoResponse` turns the inner
//! error taxonomy into a status code and a `{"error": "..."}` body.
//! Server-side failures (5xx) are captured to Sentry and logged; their
//! details never reach the client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::db::{CartError, PlaceOrderError, RepositoryError, StatusUpdateError};
use crate::services::{AuthError, SignupError};

/// Convenient result alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database or data integrity error.
    #[error("repository error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart mutation failed.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout failed.
    #[error("checkout error: {0}")]
    Checkout(#[from] PlaceOrderError),

    /// Order status change failed.
    #[error("status error: {0}")]
    Status(#[from] StatusUpdateError),

    /// Authentication failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Signup failed.
    #[error("signup error: {0}")]
    Signup(#[from] SignupError),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Missing or invalid credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unexpected server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

const INTERNAL_MESSAGE: &str = "internal server error";

fn repository_response(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "not found".to_owned()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_owned())
        }
    }
}

fn auth_response(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials | AuthError::InvalidToken => {
            (StatusCode::UNAUTHORIZED, err.to_string())
        }
        AuthError::WeakPassword(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        AuthError::PasswordHash => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_owned()),
        AuthError::Repository(inner) => repository_response(inner),
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_response(err),

            Self::Cart(CartError::InvalidQuantity(_)) => {
                (StatusCode::BAD_REQUEST, self.source_message())
            }
            Self::Cart(CartError::Repository(err)) => repository_response(err),

            Self::Checkout(err) => match err {
                PlaceOrderError::ProductNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                PlaceOrderError::InsufficientStock { .. }
                | PlaceOrderError::InvalidQuantity(_)
                | PlaceOrderError::Empty => (StatusCode::BAD_REQUEST, err.to_string()),
                PlaceOrderError::Repository(inner) => repository_response(inner),
            },

            Self::Status(err) => match err {
                StatusUpdateError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                StatusUpdateError::Repository(inner) => repository_response(inner),
            },

            Self::Auth(err) => auth_response(err),

            Self::Signup(err) => match err {
                SignupError::AlreadyRegistered(_) => (StatusCode::CONFLICT, err.to_string()),
                SignupError::InvalidCode(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                SignupError::Auth(inner) => auth_response(inner),
                SignupError::Repository(inner) => repository_response(inner),
                SignupError::Delivery(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_owned())
                }
            },

            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_owned()),
        }
    }

    /// Message of the wrapped error, without the wrapper prefix.
    fn source_message(&self) -> String {
        use std::error::Error as _;
        self.source().map_or_else(|| self.to_string(), ToString::to_string)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            sentry::capture_error(&self);
            tracing::error!(error = %self, status = %status, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// =============================================================================
// Tests
// =============================================================================
