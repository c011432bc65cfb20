//! Autosave coordinator.
//!
//! # Responsibility
//! - Watch the settled copies of every editable field group.
//! - Persist the whole entry whenever one of them settles, and report the
//!   outcome as a transient notification.
//!
//! # Invariants
//! - Every save sends all sections, health, mood and achievements
//!   together, even when a single field changed.
//! - Saves are never retried or cancelled; concurrent saves may race and
//!   the last upsert for a date wins.
//! - Installing a freshly loaded entry is not a save trigger. A snapshot
//!   taken after an install is saved only when it differs from the
//!   installed entry, i.e. when edits landed after the switch.
//! - Installs and snapshots are serialized by the switch gate, so a
//!   snapshot never mixes the previous date with the new entry's values.

use crate::gateway::PersistenceGateway;
use crate::model::entry::{
    AchievementRecord, CalendarDate, Entry, HealthRecord, Mood, SectionTag, Sections, TimeSection,
};
use crate::model::mutation::FieldGroup;
use crate::service::notify::{NotificationKind, Notifier};
use log::{debug, error, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observable autosave phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    Idle,
    Saving,
}

/// Lock held while an entry is being installed or snapshotted.
#[derive(Debug, Clone, Default)]
pub struct SwitchGate(Arc<Mutex<()>>);

impl SwitchGate {
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Receivers feeding the coordinator.
pub struct AutosaveInputs {
    pub gate: SwitchGate,
    /// Entry installed by the last load; carries the active date.
    pub installed: watch::Receiver<Entry>,
    pub mood: watch::Receiver<Mood>,
    pub mood_explanation: watch::Receiver<String>,
    pub morning: watch::Receiver<Arc<TimeSection>>,
    pub afternoon: watch::Receiver<Arc<TimeSection>>,
    pub evening: watch::Receiver<Arc<TimeSection>>,
    pub health: watch::Receiver<Arc<HealthRecord>>,
    /// Published on every edit, without debouncing.
    pub achievements: watch::Receiver<Arc<AchievementRecord>>,
}

/// What woke the coordinator up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Install,
    Field(FieldGroup),
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Field(group) => group.as_str(),
        }
    }
}

/// Snapshot of every receiver, plus the newly installed entry when the
/// snapshot is the first one after an install.
struct Snapshot {
    entry: Entry,
    installed: Option<Entry>,
}

impl AutosaveInputs {
    /// Reads the current values and marks all of them as seen.
    fn snapshot(&mut self) -> Snapshot {
        let _gate = self.gate.lock();
        let installed = if self.installed.has_changed().unwrap_or(false) {
            Some(self.installed.borrow_and_update().clone())
        } else {
            None
        };
        let date = self.installed.borrow().date;
        let entry = Entry {
            date,
            mood: *self.mood.borrow_and_update(),
            mood_explanation: self.mood_explanation.borrow_and_update().clone(),
            sections: Sections {
                morning: self.morning.borrow_and_update().clone(),
                afternoon: self.afternoon.borrow_and_update().clone(),
                evening: self.evening.borrow_and_update().clone(),
            },
            health: self.health.borrow_and_update().clone(),
            achievements: self.achievements.borrow_and_update().clone(),
        };
        Snapshot { entry, installed }
    }
}

/// Issues saves through the gateway and reports their outcome.
#[derive(Clone)]
pub struct AutosaveCoordinator {
    gateway: Arc<dyn PersistenceGateway>,
    notifier: Notifier,
    in_flight: Arc<AtomicUsize>,
}

impl AutosaveCoordinator {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, notifier: Notifier) -> Self {
        Self {
            gateway,
            notifier,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn state(&self) -> AutosaveState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            AutosaveState::Saving
        } else {
            AutosaveState::Idle
        }
    }

    /// Starts watching `inputs` until one of their senders goes away.
    pub fn spawn(&self, inputs: AutosaveInputs) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(coordinator.run(inputs))
    }

    /// Spawns one save of `entry` under `date`.
    pub fn save_now(&self, date: CalendarDate, entry: Entry) -> JoinHandle<()> {
        let gateway = Arc::clone(&self.gateway);
        let notifier = self.notifier.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let outcome = gateway.save(date, &entry).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            match outcome {
                Ok(true) => {
                    notifier.show(NotificationKind::Saved);
                }
                Ok(false) => {
                    warn!("event=autosave module=autosave status=error date={date} reason=not_saved");
                    notifier.show(NotificationKind::Error);
                }
                Err(err) => {
                    error!("event=autosave module=autosave status=error date={date} error={err}");
                    notifier.show(NotificationKind::Error);
                }
            }
        })
    }

    async fn run(self, mut inputs: AutosaveInputs) {
        loop {
            let trigger = tokio::select! {
                changed = inputs.installed.changed() => changed.map(|_| Trigger::Install),
                changed = inputs.mood.changed() => changed.map(|_| Trigger::Field(FieldGroup::Mood)),
                changed = inputs.mood_explanation.changed() => {
                    changed.map(|_| Trigger::Field(FieldGroup::MoodExplanation))
                }
                changed = inputs.morning.changed() => {
                    changed.map(|_| Trigger::Field(FieldGroup::Section(SectionTag::Morning)))
                }
                changed = inputs.afternoon.changed() => {
                    changed.map(|_| Trigger::Field(FieldGroup::Section(SectionTag::Afternoon)))
                }
                changed = inputs.evening.changed() => {
                    changed.map(|_| Trigger::Field(FieldGroup::Section(SectionTag::Evening)))
                }
                changed = inputs.health.changed() => changed.map(|_| Trigger::Field(FieldGroup::Health)),
                changed = inputs.achievements.changed() => {
                    changed.map(|_| Trigger::Field(FieldGroup::Achievements))
                }
            };
            let Ok(trigger) = trigger else {
                debug!("event=autosave_stop module=autosave status=ok");
                break;
            };

            let Snapshot { entry, installed } = inputs.snapshot();
            if installed.as_ref() == Some(&entry) {
                debug!(
                    "event=autosave_install module=autosave status=ok date={} trigger={}",
                    entry.date,
                    trigger.as_str()
                );
                continue;
            }

            debug!(
                "event=autosave_trigger module=autosave status=ok date={} trigger={}",
                entry.date,
                trigger.as_str()
            );
            self.save_now(entry.date, entry);
        }
    }
}
