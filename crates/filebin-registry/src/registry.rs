//! Registry facade
//!
//! Every id goes `absent -> live -> absent`, never back.
//!
//! Create: reserve id, write through the backend, insert into the index,
//! notify. Only the insert makes the record visible, and it happens after the
//! backend has committed the bytes, so a reader that finds a record always
//! finds complete bytes. Everything after the reservation runs in its own
//! task: a caller that stops waiting cannot leave a committed object the
//! index never heard of, or a reservation nobody releases.
//!
//! Delete: remove from the index, notify, then remove from the backend.
//! Index removal picks the single winner among concurrent deletes. If the
//! backend delete then fails, the record stays gone from the index and the
//! error is surfaced; the backend object is orphaned until the next restart
//! re-lists it.

use crate::backend::{BackendError, ContentReader, StorageBackend};
use crate::error::{RegistryError, Result};
use crate::id::{is_valid_id, IdGenerator};
use crate::index::MetadataIndex;
use crate::notifier::ChangeNotifier;
use crate::types::{FileRecord, RegistryConfig, WaitOutcome};
use axum::extract::Request;
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct Registry {
    backend: Arc<dyn StorageBackend>,
    index: Arc<MetadataIndex>,
    notifier: Arc<ChangeNotifier>,
    ids: IdGenerator,
    config: RegistryConfig,
}

impl Registry {
    /// Validate `config` and rebuild the index from what `backend` holds.
    ///
    /// Objects whose metadata cannot be read are skipped, not published.
    pub async fn open(backend: Arc<dyn StorageBackend>, config: RegistryConfig) -> Result<Self> {
        config.validate()?;

        let ids = backend
            .list()
            .await
            .map_err(|e| RegistryError::backend("list", "*", e))?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match backend.read_metadata(&id).await {
                Ok(metadata) => records.push(FileRecord::from_metadata(id, metadata)),
                Err(e) => warn!(id = %id, error = %e, "Skipping stored file with unreadable metadata"),
            }
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let index = MetadataIndex::new();
        for record in records {
            index.insert(record)?;
        }

        info!(
            backend = backend.name(),
            files = index.len(),
            "Recovered file registry"
        );

        Ok(Self {
            ids: IdGenerator::new(config.id_length, config.max_id_attempts),
            backend,
            index: Arc::new(index),
            notifier: Arc::new(ChangeNotifier::new()),
            config,
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Store `content` and publish it under a fresh id.
    ///
    /// Dropping the returned future does not cancel the upload: it still
    /// ends either live or abandoned.
    pub async fn create(
        &self,
        content: ContentReader,
        filename: &str,
        mimetype: &str,
    ) -> Result<FileRecord> {
        let id = self.ids.generate(|candidate| self.index.reserve(candidate))?;

        let upload = Upload {
            backend: self.backend.clone(),
            index: self.index.clone(),
            notifier: self.notifier.clone(),
            id: id.clone(),
        };
        let task = tokio::spawn(upload.run(content, filename.to_string(), mimetype.to_string()));

        match task.await {
            Ok(result) => result,
            Err(e) => {
                self.index.abandon(&id);
                error!(id = %id, error = %e, "Upload task failed");
                Err(RegistryError::BackendIo {
                    op: "write",
                    id,
                    source: BackendError::Io(std::io::Error::other(e)),
                })
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<FileHandle> {
        let record = self
            .index
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        Ok(FileHandle {
            record,
            backend: self.backend.clone(),
        })
    }

    /// Remove a live file. Concurrent deletes of one id: one wins, the rest
    /// get `NotFound`.
    pub async fn delete(&self, id: &str) -> Result<FileRecord> {
        if !is_valid_id(id) {
            return Err(RegistryError::NotFound(id.to_string()));
        }

        let record = self
            .index
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        self.notifier.notify_changed();

        match self.backend.delete(id).await {
            Ok(()) => {}
            Err(BackendError::NotFound(_)) => {
                warn!(id = %id, "Stored object was already gone");
            }
            Err(e) => {
                error!(
                    id = %id,
                    error = %e,
                    "File removed from index but backend delete failed, stored object is orphaned"
                );
                return Err(RegistryError::BackendIo {
                    op: "delete",
                    id: id.to_string(),
                    source: e,
                });
            }
        }

        info!(id = %id, "File deleted");
        Ok(record)
    }

    /// Every live record, oldest insert first.
    pub fn list_all(&self) -> Vec<FileRecord> {
        self.index.snapshot()
    }

    pub fn for_each<F>(&self, visit: F)
    where
        F: FnMut(&FileRecord),
    {
        self.index.for_each(visit)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub async fn wait_for_change(&self, timeout: Duration) -> WaitOutcome {
        let outcome = self.notifier.wait_for_change(timeout).await;
        debug!(?outcome, "Long-poll wait finished");
        outcome
    }
}

/// The part of a create that runs after the id is reserved.
struct Upload {
    backend: Arc<dyn StorageBackend>,
    index: Arc<MetadataIndex>,
    notifier: Arc<ChangeNotifier>,
    id: String,
}

impl Upload {
    async fn run(self, content: ContentReader, filename: String, mimetype: String) -> Result<FileRecord> {
        let metadata = match self.backend.write(&self.id, content, &filename, &mimetype).await {
            Ok(metadata) => metadata,
            Err(e) => {
                self.index.abandon(&self.id);
                warn!(id = %self.id, error = %e, "Upload failed, id abandoned");
                return Err(RegistryError::BackendIo {
                    op: "write",
                    id: self.id,
                    source: e,
                });
            }
        };

        let record = FileRecord::from_metadata(self.id, metadata);
        if let Err(e) = self.index.insert(record.clone()) {
            error!(id = %record.id, error = %e, "Index rejected a freshly written file");
            if let Err(cleanup) = self.backend.delete(&record.id).await {
                error!(id = %record.id, error = %cleanup, "Failed to remove unpublished file");
            }
            return Err(e);
        }

        self.notifier.notify_changed();
        info!(
            id = %record.id,
            filename = %record.filename,
            size = record.size,
            "File created"
        );
        Ok(record)
    }
}

/// A live record plus access to its bytes.
///
/// The record is a copy; if the file is deleted after `get`, reading reports
/// `NotFound`.
pub struct FileHandle {
    record: FileRecord,
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl FileHandle {
    pub fn record(&self) -> &FileRecord {
        &self.record
    }

    pub fn into_record(self) -> FileRecord {
        self.record
    }

    pub async fn open(&self) -> Result<ContentReader> {
        self.backend
            .read(&self.record.id)
            .await
            .map_err(|e| RegistryError::backend("read", &self.record.id, e))
    }

    /// Answer `request` with the file bytes under `mimetype`, inline or as an
    /// attachment.
    pub async fn serve(&self, request: Request, mimetype: &str, attachment: bool) -> Result<Response> {
        self.backend
            .serve(
                request,
                &self.record.id,
                &self.record.filename,
                mimetype,
                attachment,
            )
            .await
            .map_err(|e| RegistryError::backend("serve", &self.record.id, e))
    }
}
