//! Local backend whose deletes fail for chosen ids

use super::{BackendError, BackendResult, ContentReader, LocalBackend, StorageBackend};
use crate::types::FileMetadata;
use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

pub(crate) struct FailingDelete {
    inner: LocalBackend,
    fails: Box<dyn Fn(&str) -> bool + Send + Sync>,
}

impl FailingDelete {
    pub(crate) fn new(inner: LocalBackend, fails: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner,
            fails: Box::new(fails),
        }
    }
}

#[async_trait]
impl StorageBackend for FailingDelete {
    fn name(&self) -> &'static str {
        "failing-delete"
    }

    async fn list(&self) -> BackendResult<Vec<String>> {
        self.inner.list().await
    }

    async fn write(
        &self,
        id: &str,
        content: ContentReader,
        filename: &str,
        mimetype: &str,
    ) -> BackendResult<FileMetadata> {
        self.inner.write(id, content, filename, mimetype).await
    }

    async fn read(&self, id: &str) -> BackendResult<ContentReader> {
        self.inner.read(id).await
    }

    async fn read_metadata(&self, id: &str) -> BackendResult<FileMetadata> {
        self.inner.read_metadata(id).await
    }

    async fn serve(
        &self,
        request: Request,
        id: &str,
        filename: &str,
        mimetype: &str,
        attachment: bool,
    ) -> BackendResult<Response> {
        self.inner
            .serve(request, id, filename, mimetype, attachment)
            .await
    }

    async fn delete(&self, id: &str) -> BackendResult<()> {
        if (self.fails)(id) {
            return Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            )));
        }
        self.inner.delete(id).await
    }
}
