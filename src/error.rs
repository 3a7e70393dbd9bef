use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::models::attempt::StageKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Validation failed: {0}")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("Access denied. No token provided.")]
    MissingToken,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("Token expired. Please login again.")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: candidate access only")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Attempt not found")]
    AttemptNotFound,

    #[error("Attempt already completed")]
    AttemptCompleted,

    #[error("The {0} stage has already been completed")]
    StageCompleted(StageKind),

    #[error("The {0} stage is not unlocked yet")]
    StageLocked(StageKind),

    #[error("Too many requests")]
    RateLimited,

    #[error("{service} failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Error::Upstream {
            service,
            message: message.into(),
        }
    }

    /// Stable machine-readable error kind carried in every error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) | Error::InvalidInput(_) | Error::Multipart(_) => {
                "validation_failed"
            }
            Error::MissingToken => "missing_token",
            Error::InvalidToken => "invalid_token",
            Error::TokenExpired => "token_expired",
            Error::InvalidCredentials => "invalid_credentials",
            Error::Forbidden => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::AttemptNotFound => "attempt_not_found",
            Error::AttemptCompleted => "attempt_completed",
            Error::StageCompleted(_) => "stage_completed",
            Error::StageLocked(_) => "stage_locked",
            Error::RateLimited => "rate_limited",
            Error::Upstream { .. } | Error::Reqwest(_) => "upstream_failed",
            Error::Config(_)
            | Error::Database(_)
            | Error::Json(_)
            | Error::Io(_)
            | Error::Internal(_)
            | Error::Anyhow(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_)
            | Error::InvalidInput(_)
            | Error::Multipart(_)
            | Error::AttemptNotFound
            | Error::AttemptCompleted
            | Error::StageCompleted(_)
            | Error::StageLocked(_) => StatusCode::BAD_REQUEST,
            Error::MissingToken
            | Error::InvalidToken
            | Error::TokenExpired
            | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            Error::Upstream { service, .. } => {
                tracing::error!(error = %self, "upstream call failed");
                format!("{} request failed, please retry", service)
            }
            Error::Reqwest(_) => {
                tracing::error!(error = %self, "upstream call failed");
                "External service request failed, please retry".to_string()
            }
            _ if status.is_server_error() => {
                tracing::error!(error = ?self, "request failed");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "error": self.kind(),
            "message": message,
        }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}
