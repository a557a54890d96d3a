//! Core types for the file registry

use crate::error::{RegistryError, Result};
use crate::id::MIN_ID_LENGTH;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metadata a backend persists next to the bytes of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    pub mimetype: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// One live file, as held by the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub filename: String,
    pub mimetype: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn from_metadata(id: impl Into<String>, metadata: FileMetadata) -> Self {
        Self {
            id: id.into(),
            filename: metadata.filename,
            mimetype: metadata.mimetype,
            size: metadata.size,
            created_at: metadata.created_at,
        }
    }
}

/// Outcome of a long-poll wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Changed,
    TimedOut,
}

/// Summary of one expiry sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired: usize,
    pub deleted: usize,
    /// Already removed by a concurrent delete
    pub already_gone: usize,
    pub failed: usize,
}

/// Registry tuning, supplied by the configuration loader
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub id_length: usize,
    pub max_id_attempts: u32,
    pub max_age: Duration,
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id_length: MIN_ID_LENGTH,
            max_id_attempts: 16,
            max_age: Duration::from_secs(14 * 24 * 60 * 60), // 14 days
            sweep_interval: Duration::from_secs(60 * 60),    // hourly
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.id_length < MIN_ID_LENGTH {
            return Err(RegistryError::Config(format!(
                "id length must be >= {}, got {}",
                MIN_ID_LENGTH, self.id_length
            )));
        }
        if self.max_id_attempts == 0 {
            return Err(RegistryError::Config(
                "max id attempts must be > 0".to_string(),
            ));
        }
        if self.max_age.is_zero() {
            return Err(RegistryError::Config("max age must be > 0".to_string()));
        }
        if self.sweep_interval.is_zero() {
            return Err(RegistryError::Config(
                "sweep interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
