//! filebin registry
//!
//! The authoritative record of which shared files exist. Uploads are written
//! through a pluggable [`StorageBackend`], published in the in-memory
//! [`MetadataIndex`], announced to long-poll waiters through the
//! [`ChangeNotifier`], and removed again by explicit deletes or by the
//! [`ExpirySweeper`]. [`Registry`] composes all of them and is the only entry
//! point the HTTP layer uses.

pub mod backend;
pub mod error;
pub mod id;
pub mod index;
pub mod notifier;
pub mod registry;
pub mod sweeper;
pub mod types;

pub use backend::{BackendError, ContentReader, LocalBackend, StorageBackend};
pub use error::{RegistryError, Result};
pub use id::{is_valid_id, IdGenerator, MIN_ID_LENGTH};
pub use index::MetadataIndex;
pub use notifier::ChangeNotifier;
pub use registry::{FileHandle, Registry};
pub use sweeper::{is_expired, ExpirySweeper};
pub use types::{FileMetadata, FileRecord, RegistryConfig, SweepReport, WaitOutcome};
