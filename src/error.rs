use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors surfaced to API clients. Everything else (pool exhaustion,
/// signing failures, malformed stored hashes) funnels into `Internal`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid user input")]
    Validation(FieldErrors),
    #[error("confirmation token missing")]
    MissingToken,
    #[error("no availability criteria supplied")]
    MissingCriteria,
    #[error("neither email nor token supplied")]
    MissingInformation,
    #[error("invalid token")]
    InvalidToken,
    #[error("confirmation token expired")]
    ExpiredToken,
    #[error("user already exists")]
    DuplicateUser,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not logged in")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::MissingToken
            | Self::MissingCriteria
            | Self::MissingInformation
            | Self::InvalidToken
            | Self::DuplicateUser => StatusCode::BAD_REQUEST,
            Self::ExpiredToken | Self::InvalidCredentials | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid user input",
            Self::MissingToken => "Please provide confirmation token",
            Self::MissingCriteria => "Please provide the availability criteria",
            Self::MissingInformation => "Please provide additional information",
            Self::InvalidToken => "Invalid token provided",
            Self::ExpiredToken => "The confirmation link has been expired!",
            Self::DuplicateUser => "User exists with this email address",
            Self::InvalidCredentials => "Invalid email address or password",
            Self::Unauthorized => "User is not logged in",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            tracing::error!(error = %err, "internal error");
        }
        let body = match &self {
            Self::Validation(errors) => json!({ "detail": self.detail(), "errors": errors }),
            _ => json!({ "detail": self.detail() }),
        };
        (self.status(), Json(body)).into_response()
    }
}
