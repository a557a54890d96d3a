//! Error types for the filebin server

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use filebin_registry::RegistryError;
use serde_json::json;
use std::fmt;

/// Application error type that converts to HTTP responses
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    /// Missing or wrong credential; carries the realm for `WWW-Authenticate`
    Unauthorized { realm: String },
    PayloadTooLarge(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut challenge = None;
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized { realm } => {
                challenge = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm)).ok();
                (StatusCode::UNAUTHORIZED, "Authentication required".into())
            }
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        let mut response = (status, axum::Json(json!({ "error": message }))).into_response();
        if let Some(challenge) = challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, challenge);
        }
        response
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(_) => AppError::NotFound("File not found".into()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Startup and supervisor errors returned from `main`
#[derive(Debug)]
pub enum ServerError {
    Config(String),
    Io(std::io::Error),
    Registry(RegistryError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ServerError::Io(err) => write!(f, "IO error: {}", err),
            ServerError::Registry(err) => write!(f, "Registry error: {}", err),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Io(err) => Some(err),
            ServerError::Registry(err) => Some(err),
            ServerError::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Io(err)
    }
}

impl From<RegistryError> for ServerError {
    fn from(err: RegistryError) -> Self {
        ServerError::Registry(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for ServerError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ServerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
