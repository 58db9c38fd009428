/// Unified error types for the ACOMPANY service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors. `redirect` is the logical route the client should go to.
    #[error("Not authorized: {message}")]
    Authorization {
        message: String,
        redirect: Option<String>,
    },

    /// Daily bonus already used on another element
    #[error("Access denied: daily access already used for {element}, wait {hours}h {minutes}m")]
    AccessDenied {
        element: String,
        hours: i64,
        minutes: i64,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Destructive action submitted without explicit confirmation
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(String),
}

impl AppError {
    /// Forbidden with a redirect to the home view
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Authorization {
            message: message.into(),
            redirect: Some("home".to_string()),
        }
    }

    /// Short machine-readable code, also used as a metrics label
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Authentication(_) | AppError::Jwt(_) => "AuthenticationRequired",
            AppError::Authorization { .. } => "Forbidden",
            AppError::AccessDenied { .. } => "AccessDenied",
            AppError::Validation(_) => "InvalidRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::ConfirmationRequired(_) => "ConfirmationRequired",
            AppError::Database(_)
            | AppError::Serialization(_)
            | AppError::Internal(_)
            | AppError::Io(_) => "InternalServerError",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<RemainingTime>,
}

/// Cooldown carried by `AccessDenied`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RemainingTime {
    pub hours: i64,
    pub minutes: i64,
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code().to_string();
        let mut redirect = None;
        let mut remaining = None;

        let (status, message) = match &self {
            AppError::Authentication(_) | AppError::Jwt(_) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::Authorization {
                redirect: target, ..
            } => {
                redirect = target.clone();
                (StatusCode::FORBIDDEN, self.to_string())
            }
            AppError::AccessDenied { hours, minutes, .. } => {
                redirect = Some("home".to_string());
                remaining = Some(RemainingTime {
                    hours: *hours,
                    minutes: *minutes,
                });
                (StatusCode::FORBIDDEN, self.to_string())
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Conflict(_) | AppError::ConfirmationRequired(_) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::Database(_)
            | AppError::Serialization(_)
            | AppError::Internal(_)
            | AppError::Io(_) => {
                tracing::error!("internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        let body = Json(ErrorResponse {
            error: code,
            message,
            redirect,
            remaining,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type AppResult<T> = Result<T, AppError>;
