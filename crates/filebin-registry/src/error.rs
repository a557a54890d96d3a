//! Error types for the file registry

use crate::backend::BackendError;
use std::fmt;

#[derive(Debug)]
pub enum RegistryError {
    /// The id is not live. A normal negative result, not a fault.
    NotFound(String),
    /// Durable storage failed while performing `op` on `id`.
    BackendIo {
        op: &'static str,
        id: String,
        source: BackendError,
    },
    /// No free identifier was found within the configured attempts.
    CapacityExhausted { attempts: u32 },
    /// The index disagrees with what the registry expected. Indicates a bug.
    ConsistencyViolation(String),
    Config(String),
}

impl RegistryError {
    pub(crate) fn backend(op: &'static str, id: &str, source: BackendError) -> Self {
        match source {
            BackendError::NotFound(_) | BackendError::InvalidId(_) => {
                RegistryError::NotFound(id.to_string())
            }
            source => RegistryError::BackendIo {
                op,
                id: id.to_string(),
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound(id) => write!(f, "File not found: {}", id),
            RegistryError::BackendIo { op, id, source } => {
                write!(f, "Backend {} failed for {}: {}", op, id, source)
            }
            RegistryError::CapacityExhausted { attempts } => write!(
                f,
                "No free identifier after {} attempts, increase the id length",
                attempts
            ),
            RegistryError::ConsistencyViolation(msg) => {
                write!(f, "Registry consistency violation: {}", msg)
            }
            RegistryError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::BackendIo { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
