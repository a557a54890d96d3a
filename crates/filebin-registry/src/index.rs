//! In-memory metadata index
//!
//! Maps ids to [`FileRecord`]s and tracks which ids are in use. An id moves
//! through three sets over its life:
//!
//! - `pending`: reserved by a create whose backend write has not finished
//! - `live`: published, visible to readers
//! - `retired`: deleted or abandoned, never issued again
//!
//! All access goes through one std `RwLock`. No caller holds it across an
//! `.await`, so backend I/O never runs under it.

use crate::error::{RegistryError, Result};
use crate::types::FileRecord;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct Slot {
    seq: u64,
    record: FileRecord,
}

#[derive(Debug, Default)]
struct IndexState {
    live: HashMap<String, Slot>,
    pending: HashSet<String>,
    retired: HashSet<String>,
    next_seq: u64,
}

impl IndexState {
    fn in_use(&self, id: &str) -> bool {
        self.live.contains_key(id) || self.pending.contains(id) || self.retired.contains(id)
    }
}

#[derive(Debug, Default)]
pub struct MetadataIndex {
    state: RwLock<IndexState>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve `id` for an upcoming insert.
    ///
    /// Returns `false` if the id is live, pending, or retired.
    pub fn reserve(&self, id: &str) -> bool {
        let mut state = self.write();
        if state.in_use(id) {
            return false;
        }
        state.pending.insert(id.to_string())
    }

    /// Give up a reservation whose write failed. The id is retired, not freed.
    pub fn abandon(&self, id: &str) {
        let mut state = self.write();
        if state.pending.remove(id) {
            state.retired.insert(id.to_string());
        }
    }

    /// Publish a record.
    ///
    /// The record's id should be pending; inserting over a live or retired id
    /// is a consistency violation and leaves the index unchanged.
    pub fn insert(&self, record: FileRecord) -> Result<()> {
        let mut state = self.write();
        if state.live.contains_key(&record.id) {
            return Err(RegistryError::ConsistencyViolation(format!(
                "id {} is already live",
                record.id
            )));
        }
        if state.retired.contains(&record.id) {
            return Err(RegistryError::ConsistencyViolation(format!(
                "id {} was retired",
                record.id
            )));
        }

        state.pending.remove(&record.id);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.live.insert(record.id.clone(), Slot { seq, record });
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<FileRecord> {
        self.read().live.get(id).map(|slot| slot.record.clone())
    }

    /// Remove a live record and retire its id.
    ///
    /// Exactly one of any number of concurrent calls for the same id gets
    /// `Some`; the rest get `None`.
    pub fn remove(&self, id: &str) -> Option<FileRecord> {
        let mut state = self.write();
        let slot = state.live.remove(id)?;
        state.retired.insert(slot.record.id.clone());
        Some(slot.record)
    }

    /// Point-in-time copy of every live record, in insertion order.
    pub fn snapshot(&self) -> Vec<FileRecord> {
        let mut slots: Vec<(u64, FileRecord)> = self
            .read()
            .live
            .values()
            .map(|slot| (slot.seq, slot.record.clone()))
            .collect();
        slots.sort_by_key(|(seq, _)| *seq);
        slots.into_iter().map(|(_, record)| record).collect()
    }

    /// Visit a snapshot of every live record, in insertion order.
    ///
    /// The lock is released before `visit` runs, so the visitor may call back
    /// into the index (including `remove`).
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&FileRecord),
    {
        for record in self.snapshot() {
            visit(&record);
        }
    }

    pub fn len(&self) -> usize {
        self.read().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
