//! Storage backends
//!
//! A backend durably stores file bytes plus their [`FileMetadata`], addressed
//! only by id. Exactly one backend is active at a time; the registry holds it
//! as `Arc<dyn StorageBackend>` so new backends (object storage, ...) plug in
//! without touching the registry.

mod local;
#[cfg(test)]
pub(crate) mod failing;

pub use local::LocalBackend;

use crate::types::FileMetadata;
use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use std::fmt;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Byte stream handed to and returned from a backend
pub type ContentReader = Pin<Box<dyn AsyncRead + Send>>;

#[derive(Debug)]
pub enum BackendError {
    NotFound(String),
    AlreadyExists(String),
    /// The id cannot address an object (wrong alphabet, path separators, ...)
    InvalidId(String),
    Io(std::io::Error),
    Metadata(serde_json::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NotFound(id) => write!(f, "Object not found: {}", id),
            BackendError::AlreadyExists(id) => write!(f, "Object already exists: {}", id),
            BackendError::InvalidId(id) => write!(f, "Invalid object id: {:?}", id),
            BackendError::Io(err) => write!(f, "IO error: {}", err),
            BackendError::Metadata(err) => write!(f, "Metadata error: {}", err),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Io(err) => Some(err),
            BackendError::Metadata(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err)
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Metadata(err)
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short name for diagnostics
    fn name(&self) -> &'static str;

    /// Every id currently stored. Only used to rebuild the index at startup.
    async fn list(&self) -> BackendResult<Vec<String>>;

    /// Store `content` under `id`.
    ///
    /// All or nothing: once `id` is visible to `read`/`list`, its bytes and
    /// metadata are complete. A failed or cancelled write leaves nothing
    /// visible. The returned metadata carries the byte count and timestamp.
    async fn write(
        &self,
        id: &str,
        content: ContentReader,
        filename: &str,
        mimetype: &str,
    ) -> BackendResult<FileMetadata>;

    async fn read(&self, id: &str) -> BackendResult<ContentReader>;

    async fn read_metadata(&self, id: &str) -> BackendResult<FileMetadata>;

    /// Answer an HTTP request for the bytes of `id`, honouring range and
    /// conditional headers where the backend can.
    async fn serve(
        &self,
        request: Request,
        id: &str,
        filename: &str,
        mimetype: &str,
        attachment: bool,
    ) -> BackendResult<Response>;

    async fn delete(&self, id: &str) -> BackendResult<()>;
}

/// `Content-Disposition` value for a stored file
pub fn content_disposition(filename: &str, attachment: bool) -> String {
    let kind = if attachment { "attachment" } else { "inline" };
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        kind,
        fallback,
        urlencoding::encode(filename)
    )
}
