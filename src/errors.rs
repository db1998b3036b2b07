//! Errors surfaced by account operations and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::users::StoreError;

pub const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum AccountError {
    /// Unknown login or wrong password; callers cannot tell which.
    #[error("invalid login or password")]
    InvalidCredentials,
    /// Missing, invalid or expired token, or a subject the policy does not allow.
    #[error("forbidden")]
    Forbidden,
    #[error("user not found")]
    NotFound,
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("{action} failed: {source}")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccountError {
    pub fn store(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| AccountError::Store { action, source }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AccountError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::message("Invalid login or password"),
            ),
            AccountError::Forbidden => (StatusCode::FORBIDDEN, ErrorBody::message("Forbidden")),
            AccountError::NotFound => (StatusCode::NOT_FOUND, ErrorBody::message("User not found")),
            AccountError::MalformedRequest(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: "Malformed request".into(),
                    error: Some(detail),
                },
            ),
            AccountError::Store { action, source } => {
                error!(error = %source, action, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: format!("Failed to {action}"),
                        error: Some(source.kind().into()),
                    },
                )
            }
            AccountError::Internal(e) => {
                error!(error = ?e, "unhandled internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message(GENERIC_FAILURE),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
