//! Broadcast change notification for long-poll clients

use crate::types::WaitOutcome;
use std::time::Duration;
use tokio::sync::Notify;

/// Wakes every waiter blocked in [`ChangeNotifier::wait_for_change`] when the
/// index changes.
///
/// Nothing is buffered: a waiter only sees changes that happen while it is
/// waiting.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    notify: Notify,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify_changed(&self) {
        self.notify.notify_waiters();
    }

    /// Block until the next change or until `timeout` elapses.
    pub async fn wait_for_change(&self, timeout: Duration) -> WaitOutcome {
        // `notify_waiters` reaches a `Notified` from the moment it is created,
        // so a change between here and the first poll is not lost.
        let notified = self.notify.notified();
        match tokio::time::timeout(timeout, notified).await {
            Ok(()) => WaitOutcome::Changed,
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}
