// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Shared by the HTTP service, the stores and the client library so that
/// the same taxonomy travels across the wire and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request: malformed input, no state was mutated.
    ValidationError(String),

    // 401 Unauthorized: credential mismatch or missing/expired token.
    AuthError(String),

    // 403 Forbidden: authenticated, but not allowed to touch this resource.
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict: operation refused in the current quiz/session state.
    StateError(String),

    // 502 Bad Gateway: the remote service could not be reached.
    TransportError(String),
}

impl AppError {
    /// Uniform credential failure. Never reveals whether the email exists.
    pub fn invalid_credentials() -> Self {
        AppError::AuthError("Invalid email or password".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StateError(_) => StatusCode::CONFLICT,
            AppError::TransportError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Rebuilds an error from an HTTP status and the `{"error": ..}` body
    /// produced by `into_response`.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                AppError::ValidationError(message)
            }
            StatusCode::UNAUTHORIZED => AppError::AuthError(message),
            StatusCode::FORBIDDEN => AppError::Forbidden(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::CONFLICT => AppError::StateError(message),
            s if s.is_server_error() && s != StatusCode::INTERNAL_SERVER_ERROR => {
                AppError::TransportError(message)
            }
            _ => AppError::InternalServerError(message),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::InternalServerError(msg)
            | AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::StateError(msg)
            | AppError::TransportError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::TransportError(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                msg
            }
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::StateError(msg) => msg,
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// Connection-level failures of the HTTP client.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::InternalServerError(err.to_string())
        } else {
            AppError::TransportError(err.to_string())
        }
    }
}
