//! Short random identifiers
//!
//! Ids are drawn from `[A-Za-z0-9]`. Uniqueness is not left to chance: every
//! candidate is offered to a claim function (the index reservation) and
//! retried on collision.

use crate::error::{RegistryError, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, warn};

/// Shortest id the registry will issue
pub const MIN_ID_LENGTH: usize = 8;

/// Longest id accepted from clients or found on disk
pub const MAX_ID_LENGTH: usize = 255;

/// Whether `id` could have been issued by an [`IdGenerator`].
///
/// Recovered ids may be shorter or longer than the current configured length,
/// so only the alphabet and the hard bounds are checked.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[derive(Debug, Clone)]
pub struct IdGenerator {
    length: usize,
    max_attempts: u32,
}

impl IdGenerator {
    pub fn new(length: usize, max_attempts: u32) -> Self {
        Self {
            length: length.clamp(MIN_ID_LENGTH, MAX_ID_LENGTH),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn candidate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }

    /// Generate an id that `claim` accepts.
    ///
    /// `claim` must atomically check the candidate against every id in use and
    /// reserve it, returning `false` on collision.
    pub fn generate<F>(&self, mut claim: F) -> Result<String>
    where
        F: FnMut(&str) -> bool,
    {
        for attempt in 1..=self.max_attempts {
            let id = self.candidate();
            if claim(&id) {
                return Ok(id);
            }
            debug!(attempt, "Identifier collision, retrying");
        }

        warn!(
            attempts = self.max_attempts,
            length = self.length,
            "Identifier space exhausted"
        );
        Err(RegistryError::CapacityExhausted {
            attempts: self.max_attempts,
        })
    }
}
