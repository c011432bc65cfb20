//! Trailing-edge debounce primitive.
//!
//! # Responsibility
//! - Publish a value on a watch channel only after it stayed unchanged for
//!   the configured delay.
//!
//! # Invariants
//! - Every `push` re-arms the timer; a superseded value is dropped, never
//!   queued.
//! - Settling publishes only when the value differs from the observed one.
//! - Nothing is published after `cancel` (or drop) returns: cancellation
//!   and settlement both run under the channel lock and are ordered by a
//!   generation counter.
//! - `reset` replaces the observed value without notifying subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One independent debounce instance for a watched field group.
pub struct Debouncer<T> {
    delay: Duration,
    sender: Arc<watch::Sender<T>>,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T> {
    /// Returns a receiver of settled values.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns whether a pushed value is still waiting to settle.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Drops any pending value.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        let generation = &self.generation;
        self.sender.send_if_modified(|_| {
            generation.fetch_add(1, Ordering::SeqCst);
            false
        });
    }
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            delay,
            sender: Arc::new(sender),
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    /// Returns the last settled value.
    pub fn settled(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Re-arms the timer with `value`.
    ///
    /// # Panics
    /// - Panics when called outside a Tokio runtime.
    pub fn push(&mut self, value: T) {
        self.cancel();
        let armed_generation = self.generation.load(Ordering::SeqCst);
        let generation = Arc::clone(&self.generation);
        let sender = Arc::clone(&self.sender);
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sender.send_if_modified(|observed| {
                if generation.load(Ordering::SeqCst) != armed_generation || *observed == value {
                    return false;
                }
                *observed = value;
                true
            });
        }));
    }

    /// Cancels any pending value and silently replaces the observed one.
    pub fn reset(&mut self, value: T) {
        self.cancel();
        self.sender.send_if_modified(|observed| {
            *observed = value;
            false
        });
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
