use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input; returns the offending fields.
    #[error("validation failed")]
    Validation(FieldErrors),
    /// Resource already exists (duplicate email on sign-up).
    #[error("{message}")]
    Conflict {
        errors: FieldErrors,
        message: &'static str,
    },
    /// Wrong credentials on sign-in. Unknown email and wrong password
    /// produce this same variant so the response bodies are identical.
    #[error("invalid email or password")]
    InvalidSignIn,
    /// Refresh token cookie absent.
    #[error("{0}")]
    Unauthorized(&'static str),
    /// Refresh token failed verification, or its session is gone.
    #[error("{0}")]
    Forbidden(&'static str),
    /// Bearer token absent from the Authorization header.
    #[error("missing authorization token")]
    MissingCredentials,
    /// Bearer token present but invalid or expired.
    #[error("invalid or expired token")]
    InvalidCredentials,
    #[error("{0}")]
    NotFound(String),
    /// Store or signing failure; details are logged, the body stays generic.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn email_taken() -> Self {
        let mut errors = FieldErrors::new();
        errors.insert("email".into(), vec!["Email is already taken".into()]);
        AppError::Conflict {
            errors,
            message: "User already exists",
        }
    }
}

const INVALID_SIGN_IN_MESSAGE: &str = "Invalid email or password";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": errors, "message": "Validation failed" })),
            )
                .into_response(),
            AppError::Conflict { errors, message } => (
                StatusCode::CONFLICT,
                Json(json!({ "errors": errors, "message": message })),
            )
                .into_response(),
            AppError::InvalidSignIn => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "errors": { "email": [INVALID_SIGN_IN_MESSAGE] },
                    "message": INVALID_SIGN_IN_MESSAGE,
                })),
            )
                .into_response(),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": message })),
            )
                .into_response(),
            AppError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, Json(json!({ "message": message }))).into_response()
            }
            AppError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Missing authorization token" })),
            )
                .into_response(),
            AppError::InvalidCredentials => (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": "Invalid or expired token" })),
            )
                .into_response(),
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
            }
            AppError::Internal(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::Internal(err.into()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::Validation(fields)
    }
}
