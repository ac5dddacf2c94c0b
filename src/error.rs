use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Auth(String),

    #[error("Failed to fetch {resource}: {message}")]
    Fetch {
        resource: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Persistence(String),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Not found")]
    NotFound,
}

impl AppError {
    /// Transport failures and 5xx responses; only reads act on this.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AppError::Fetch { status: Some(status), .. } => *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Fetch { .. } | AppError::Http(_) | AppError::Parse(_) => {
                error!("data api error: {}", self);
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Persistence(msg) => {
                error!("data api write failed: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Hashing(msg) => {
                error!("password hashing failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
