//! Transient save notifications.
//!
//! # Responsibility
//! - Publish the outcome of each autosave as a short-lived notification.
//! - Dismiss it automatically once its display window elapses.
//!
//! # Invariants
//! - A newer notification restarts the display window; a stale dismissal
//!   never clears a newer notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const SAVED_MESSAGE: &str = "Changes saved automatically";
pub const ERROR_MESSAGE: &str = "Error saving changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Saved,
    Error,
}

impl NotificationKind {
    pub fn message(self) -> &'static str {
        match self {
            Self::Saved => SAVED_MESSAGE,
            Self::Error => ERROR_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: &'static str,
    /// Monotonic sequence number; identifies this notification instance.
    pub seq: u64,
}

/// Cloneable handle publishing notifications to the presentation layer.
#[derive(Clone)]
pub struct Notifier {
    sender: Arc<watch::Sender<Option<Notification>>>,
    next_seq: Arc<AtomicU64>,
    ttl: Duration,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
            next_seq: Arc::new(AtomicU64::new(1)),
            ttl,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.sender.subscribe()
    }

    /// Returns the notification currently on display.
    pub fn current(&self) -> Option<Notification> {
        self.sender.borrow().clone()
    }

    /// Shows a notification and schedules its dismissal.
    ///
    /// # Panics
    /// - Panics when called outside a Tokio runtime.
    pub fn show(&self, kind: NotificationKind) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.sender.send_replace(Some(Notification {
            kind,
            message: kind.message(),
            seq,
        }));

        let sender = Arc::clone(&self.sender);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            sender.send_if_modified(|current| {
                if current.as_ref().is_some_and(|shown| shown.seq == seq) {
                    *current = None;
                    return true;
                }
                false
            });
        });
        seq
    }

    /// Dismisses the current notification early.
    pub fn dismiss(&self) {
        self.sender.send_if_modified(|current| current.take().is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationKind, Notifier, ERROR_MESSAGE};
    use std::time::Duration;
    use tokio::time::sleep;

    const TTL: Duration = Duration::from_millis(3000);

    #[tokio::test(start_paused = true)]
    async fn notification_auto_dismisses_after_ttl() {
        let notifier = Notifier::new(TTL);
        notifier.show(NotificationKind::Error);

        let shown = notifier.current().unwrap();
        assert_eq!(shown.message, ERROR_MESSAGE);

        sleep(Duration::from_millis(2999)).await;
        assert!(notifier.current().is_some());
        sleep(Duration::from_millis(2)).await;
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_notification_restarts_window() {
        let notifier = Notifier::new(TTL);
        notifier.show(NotificationKind::Saved);
        sleep(Duration::from_millis(2000)).await;
        let second = notifier.show(NotificationKind::Saved);

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(notifier.current().map(|shown| shown.seq), Some(second));

        sleep(Duration::from_millis(1600)).await;
        assert!(notifier.current().is_none());
    }

    #[tokio::test]
    async fn dismiss_clears_immediately() {
        let notifier = Notifier::new(TTL);
        notifier.show(NotificationKind::Saved);
        notifier.dismiss();
        assert!(notifier.current().is_none());
    }
}
