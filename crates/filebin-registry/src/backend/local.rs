//! Local filesystem backend
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<id>/content        file bytes
//! <root>/<id>/metadata.json  FileMetadata sidecar
//! <root>/.staging/           writes in progress
//! <root>/.trash/             deletes in progress
//! ```
//!
//! A write is assembled in `.staging` and published with a single directory
//! rename, so `<root>/<id>` only ever appears complete. Deletes rename the
//! object into `.trash` first, so it disappears in one step too.

use super::{content_disposition, BackendError, BackendResult, ContentReader, StorageBackend};
use crate::id::is_valid_id;
use crate::types::FileMetadata;
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, info, warn};

const CONTENT_FILE: &str = "content";
const METADATA_FILE: &str = "metadata.json";
const STAGING_DIR: &str = ".staging";
const TRASH_DIR: &str = ".trash";

/// Removes an unpublished staging directory when dropped. Failed writes
/// discard it explicitly; the drop path covers writes whose future was
/// cancelled.
struct Staging {
    path: PathBuf,
    armed: bool,
}

impl Staging {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    async fn discard(mut self) {
        self.disarm();
        match fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staging directory")
            }
        }
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_staging(&path));
            }
            Err(_) => remove_staging(&path),
        }
    }
}

fn remove_staging(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove staging directory");
        }
    }
}

/// Move a finished staging directory to its final name and make the rename
/// durable. Runs as one blocking step; once started it completes even if the
/// caller stops waiting.
fn publish(staging: &Path, object_dir: &Path, root: &Path) -> std::io::Result<()> {
    std::fs::rename(staging, object_dir)?;
    // Not every platform allows syncing a directory handle.
    if let Ok(dir) = std::fs::File::open(root) {
        let _ = dir.sync_all();
    }
    Ok(())
}

pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Open (creating if needed) a backend rooted at `root`.
    ///
    /// Staging and trash left behind by a previous process are purged.
    pub async fn new<P: AsRef<Path>>(root: P) -> BackendResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        for scratch in [STAGING_DIR, TRASH_DIR] {
            let path = root.join(scratch);
            match fs::remove_dir_all(&path).await {
                Ok(()) => debug!(path = %path.display(), "Purged leftover scratch directory"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            fs::create_dir_all(&path).await?;
        }

        info!(path = %root.display(), "Initialized local storage backend");
        Ok(Self { root })
    }

    fn object_dir(&self, id: &str) -> BackendResult<PathBuf> {
        if !is_valid_id(id) {
            return Err(BackendError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(id))
    }

    fn scratch_path(&self, scratch: &str, id: &str) -> PathBuf {
        self.root
            .join(scratch)
            .join(format!("{}.{}", id, uuid::Uuid::new_v4().simple()))
    }

    async fn stage_and_publish(
        &self,
        staging: &mut Staging,
        object_dir: &Path,
        mut content: ContentReader,
        filename: &str,
        mimetype: &str,
    ) -> BackendResult<FileMetadata> {
        fs::create_dir(&staging.path).await?;

        let mut file = fs::File::create(staging.path.join(CONTENT_FILE)).await?;
        let size = tokio::io::copy(&mut content, &mut file).await?;
        file.sync_all().await?;
        drop(file);

        let metadata = FileMetadata {
            filename: filename.to_string(),
            mimetype: mimetype.to_string(),
            size,
            created_at: Utc::now(),
        };
        let mut sidecar = fs::File::create(staging.path.join(METADATA_FILE)).await?;
        sidecar
            .write_all(&serde_json::to_vec_pretty(&metadata)?)
            .await?;
        sidecar.sync_all().await?;
        drop(sidecar);

        // The blocking publish runs to completion even if this future is
        // dropped, so the drop guard must not race it for the directory.
        staging.disarm();
        let (from, to, root) = (staging.path.clone(), object_dir.to_path_buf(), self.root.clone());
        tokio::task::spawn_blocking(move || publish(&from, &to, &root))
            .await
            .map_err(std::io::Error::other)??;
        Ok(metadata)
    }
}

fn not_found_as(id: &str, err: std::io::Error) -> BackendError {
    if err.kind() == ErrorKind::NotFound {
        BackendError::NotFound(id.to_string())
    } else {
        BackendError::Io(err)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list(&self) -> BackendResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_valid_id(&name) {
                continue;
            }
            if entry.file_type().await?.is_dir() {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn write(
        &self,
        id: &str,
        content: ContentReader,
        filename: &str,
        mimetype: &str,
    ) -> BackendResult<FileMetadata> {
        let object_dir = self.object_dir(id)?;
        if fs::try_exists(&object_dir).await? {
            return Err(BackendError::AlreadyExists(id.to_string()));
        }

        let mut staging = Staging::new(self.scratch_path(STAGING_DIR, id));
        match self
            .stage_and_publish(&mut staging, &object_dir, content, filename, mimetype)
            .await
        {
            Ok(metadata) => {
                debug!(id, size = metadata.size, "Stored file");
                Ok(metadata)
            }
            Err(e) => {
                staging.discard().await;
                Err(e)
            }
        }
    }

    async fn read(&self, id: &str) -> BackendResult<ContentReader> {
        let path = self.object_dir(id)?.join(CONTENT_FILE);
        let file = fs::File::open(&path)
            .await
            .map_err(|e| not_found_as(id, e))?;
        Ok(Box::pin(file))
    }

    async fn read_metadata(&self, id: &str) -> BackendResult<FileMetadata> {
        let path = self.object_dir(id)?.join(METADATA_FILE);
        let raw = fs::read(&path).await.map_err(|e| not_found_as(id, e))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn serve(
        &self,
        request: Request,
        id: &str,
        filename: &str,
        mimetype: &str,
        attachment: bool,
    ) -> BackendResult<Response> {
        let path = self.object_dir(id)?.join(CONTENT_FILE);
        let mut response = ServeFile::new(path)
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {})
            .map(Body::new);

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(id.to_string()));
        }

        if response.status().is_success() || response.status() == StatusCode::NOT_MODIFIED {
            let headers = response.headers_mut();
            let content_type = HeaderValue::from_str(mimetype)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
            headers.insert(header::CONTENT_TYPE, content_type);
            if let Ok(value) = HeaderValue::from_str(&content_disposition(filename, attachment)) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            headers.insert(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            );
        }

        Ok(response)
    }

    async fn delete(&self, id: &str) -> BackendResult<()> {
        let object_dir = self.object_dir(id)?;
        let trash = self.scratch_path(TRASH_DIR, id);

        fs::rename(&object_dir, &trash)
            .await
            .map_err(|e| not_found_as(id, e))?;

        if let Err(e) = fs::remove_dir_all(&trash).await {
            // Already invisible; the trash is purged on the next start.
            warn!(id, error = %e, path = %trash.display(), "Failed to purge deleted file");
        }

        debug!(id, "Deleted file");
        Ok(())
    }
}
