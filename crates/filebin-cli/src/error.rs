//! Error types for the filebin client

use std::fmt;

#[derive(Debug)]
pub enum CliError {
    /// Request could not be sent or the response not read
    Http(reqwest::Error),
    /// Server answered with a non-success status
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Server accepted the request but could not store the file
    UploadFailed(String),
    Json(serde_json::Error),
    Io(std::io::Error),
    InvalidUrl(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Status { status, body } if body.trim().is_empty() => {
                write!(f, "Server returned {}", status)
            }
            Self::Status { status, body } => {
                write!(f, "Server returned {}: {}", status, body.trim())
            }
            Self::UploadFailed(name) => write!(f, "Server failed to store {}", name),
            Self::Json(e) => write!(f, "Invalid JSON from server: {}", e),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::InvalidUrl(msg) => write!(f, "Invalid server URL: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
