//! Error types for esagate
//!
//! Request-local errors are converted to `AppError`, which implements
//! `IntoResponse` so handlers can simply return `Result<_, AppError>`.
//! Only `Config` is fatal, and only during startup.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid settings (startup-fatal)
    #[error("config error: {0}")]
    Config(String),

    /// OAuth2 provider rejected the login or the code exchange failed (401)
    #[error("{0}")]
    Authentication(String),

    /// Upstream API answered with a non-success status or an unreadable body (500)
    #[error("{0}")]
    Upstream(String),

    /// Transport failure talking to the upstream API (500)
    #[error("{0}")]
    HttpClient(#[from] reqwest::Error),

    /// Session cookie failed to decode or verify.
    ///
    /// Never rendered: the session store turns it into an empty session.
    #[error("session cookie is malformed or has an invalid signature")]
    SessionIntegrity,

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// HTTP status used when this error reaches a handler boundary
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::SessionIntegrity => StatusCode::UNAUTHORIZED,
            AppError::Config(_)
            | AppError::Upstream(_)
            | AppError::HttpClient(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to a plain-text HTTP response
    ///
    /// The body is the human-readable message followed by a newline.
    /// Internal details are not echoed back.
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Authentication(msg) => {
                tracing::warn!(error = %msg, "Authentication failed");
                msg.clone()
            }
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream API request failed");
                msg.clone()
            }
            AppError::HttpClient(err) => {
                tracing::error!(error = %err, "Upstream API transport error");
                err.to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                "Internal server error".to_string()
            }
            AppError::Config(_) | AppError::SessionIntegrity => {
                tracing::error!(error = %self, "Unexpected error at handler boundary");
                self.to_string()
            }
        };

        (status, format!("{message}\n")).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
