//! Background expiry sweep

use crate::error::RegistryError;
use crate::registry::Registry;
use crate::types::{FileRecord, SweepReport};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// True once `created_at + max_age` is not after `now`.
///
/// A `max_age` too large to represent never expires.
pub fn is_expired(record: &FileRecord, max_age: Duration, now: DateTime<Utc>) -> bool {
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
        return false;
    };
    record
        .created_at
        .checked_add_signed(max_age)
        .is_some_and(|deadline| deadline <= now)
}

pub struct ExpirySweeper {
    registry: Arc<Registry>,
    max_age: Duration,
    interval: Duration,
}

impl ExpirySweeper {
    /// Sweeper using the registry's configured max age and interval
    pub fn new(registry: Arc<Registry>) -> Self {
        let max_age = registry.config().max_age;
        let interval = registry.config().sweep_interval;
        Self {
            registry,
            max_age,
            interval,
        }
    }

    pub async fn sweep_once(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// One pass over the index, treating `now` as the current time.
    ///
    /// Every expired record is deleted concurrently. Per-record failures are
    /// counted and logged; they never stop the pass.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        let mut expired = Vec::new();
        self.registry.for_each(|record| {
            report.scanned += 1;
            if is_expired(record, self.max_age, now) {
                expired.push(record.id.clone());
            }
        });
        report.expired = expired.len();

        let results = join_all(expired.iter().map(|id| self.registry.delete(id))).await;
        for (id, result) in expired.iter().zip(results) {
            match result {
                Ok(_) => report.deleted += 1,
                Err(RegistryError::NotFound(_)) => {
                    debug!(id = %id, "Expired file already deleted");
                    report.already_gone += 1;
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to delete expired file");
                    report.failed += 1;
                }
            }
        }

        if report.expired > 0 {
            info!(
                scanned = report.scanned,
                deleted = report.deleted,
                already_gone = report.already_gone,
                failed = report.failed,
                "Expiry sweep finished"
            );
        } else {
            debug!(scanned = report.scanned, "Expiry sweep found nothing to delete");
        }
        report
    }

    /// Sweep immediately, then every interval, until `shutdown` turns true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            max_age_secs = self.max_age.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Starting expiry sweeper"
        );
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Expiry sweeper stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
