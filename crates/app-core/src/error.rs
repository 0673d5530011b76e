//! Centralized error handling for the Axum application.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use super::config::ConfigError;
use super::jwt::JwtError;
use super::oauth::OAuthError;
use super::password::HashingError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Validation failed")]
    ValidationStr(String),

    #[error("Invalid request format: {0}")]
    RequestFormat(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Internal libraries
    #[error("Config operation failed")]
    Config(#[from] ConfigError),

    #[error("JWT operation failed")]
    Jwt(#[from] JwtError),

    #[error("OAuth operation failed")]
    OAuth(#[from] OAuthError),

    #[error("Password hashing operation failed")]
    Hashing(#[from] HashingError),

    // Third-party libraries
    #[error("Database operation failed")]
    Database(#[from] sqlx::Error),

    #[error("Template rendering failed")]
    Template(#[from] askama::Error),

    #[error("Serde JSON operation failed")]
    JsonParse(#[from] serde_json::Error),

    #[error("An internal server error occurred")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Validation(err) => {
                let details = json!(err.field_errors());
                (StatusCode::UNPROCESSABLE_ENTITY, "Validation failed".to_string(), Some(details))
            },
            AppError::ValidationStr(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            AppError::RequestFormat(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),

            // Internal libraries
            AppError::Config(err) => {
                tracing::error!("Config getter error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                    None,
                )
            },
            AppError::Jwt(err) => {
                tracing::error!("JWT error: {:?}", err);
                let status = match err {
                    JwtError::TokenExpired | JwtError::InvalidToken => StatusCode::UNAUTHORIZED,
                    JwtError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = match err {
                    JwtError::TokenExpired | JwtError::InvalidToken => err.to_string(),
                    JwtError::TokenCreation => "An internal server error occurred".to_string(),
                };
                (status, message, None)
            },
            AppError::OAuth(err) => {
                let status = match err {
                    OAuthError::InvalidUrl(_) | OAuthError::TokenExchange(_) | OAuthError::ProviderNotFound(_) => {
                        StatusCode::BAD_REQUEST
                    },

                    OAuthError::HttpClient(_) | OAuthError::ProfileParse => StatusCode::BAD_GATEWAY,
                };

                let message = match err {
                    OAuthError::InvalidUrl(_) | OAuthError::ProviderNotFound(_) => err.to_string(),
                    OAuthError::HttpClient(_) | OAuthError::ProfileParse => "OAuth provider unavailable".to_string(),
                    OAuthError::TokenExchange(_) => "OAuth operation failed".to_string(),
                };

                (status, message, None)
            },
            AppError::Hashing(err) => {
                tracing::error!("Password hashing error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                    None,
                )
            },

            // Third-party libraries
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                    None,
                )
            },
            AppError::Template(err) => {
                tracing::error!("Template rendering error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                    None,
                )
            },
            AppError::JsonParse(err) => {
                tracing::error!("Failed to parse JSON: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                    None,
                )
            },
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
                None,
            ),
        };

        (status, Json(ErrorResponse { message, details })).into_response()
    }
}
