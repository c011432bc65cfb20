//! Journal session orchestration.
//!
//! # Responsibility
//! - Own the form store for the active date and feed every edit into the
//!   debouncer of its field group.
//! - Run the autosave coordinator for the lifetime of the session.
//! - Switch dates: flush, cancel, load, then repopulate in one step.
//! - Step to the previous or next calendar day.
//!
//! # Invariants
//! - Edits are applied synchronously; persistence is always asynchronous.
//! - Repopulating after a load never triggers a save, but edits made after
//!   the switch always do, including achievement edits.
//! - Once the session is dropped no pending debounce timer fires; saves
//!   already handed to the gateway still complete.

use crate::config::JournalConfig;
use crate::gateway::{LoadPath, PersistenceGateway};
use crate::model::entry::{
    AchievementRecord, Activity, ActivityNoteKey, CalendarDate, Entry, HealthRecord, Mood,
    SectionTag, TimeSection,
};
use crate::model::mutation::{EntryMutation, FieldGroup};
use crate::service::autosave::{AutosaveCoordinator, AutosaveInputs, AutosaveState, SwitchGate};
use crate::service::debounce::Debouncer;
use crate::service::loader::load_entry;
use crate::service::notify::{Notification, Notifier};
use crate::service::store::FormStore;
use log::{debug, info};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One open journal session bound to a persistence gateway.
pub struct Journal {
    store: FormStore,
    gateway: Arc<dyn PersistenceGateway>,
    gate: SwitchGate,
    installed_tx: watch::Sender<Entry>,
    mood: Debouncer<Mood>,
    mood_explanation: Debouncer<String>,
    sections: [Debouncer<Arc<TimeSection>>; 3],
    health: Debouncer<Arc<HealthRecord>>,
    achievements_tx: watch::Sender<Arc<AchievementRecord>>,
    autosave: AutosaveCoordinator,
    autosave_task: JoinHandle<()>,
    notifier: Notifier,
}

impl Journal {
    /// Opens a session on `date`, populated from the automatic load.
    ///
    /// Achievements are not part of the automatic load and start empty.
    pub async fn open(
        gateway: Arc<dyn PersistenceGateway>,
        config: &JournalConfig,
        date: CalendarDate,
    ) -> Self {
        let record = gateway.load(date, LoadPath::Automatic).await;
        let entry = load_entry(date, record.as_ref(), LoadPath::Automatic);
        info!(
            "event=journal_open module=journal status=ok date={date} found={}",
            record.is_some()
        );
        Self::with_entry(gateway, config, entry)
    }

    /// Starts a session on an already built entry without loading.
    ///
    /// # Panics
    /// - Panics when called outside a Tokio runtime.
    pub fn with_entry(
        gateway: Arc<dyn PersistenceGateway>,
        config: &JournalConfig,
        entry: Entry,
    ) -> Self {
        let delay = config.autosave_delay;
        let notifier = Notifier::new(config.notification_ttl);
        let gate = SwitchGate::default();
        let (installed_tx, _) = watch::channel(entry.clone());
        let (achievements_tx, _) = watch::channel(Arc::clone(&entry.achievements));
        let mood = Debouncer::new(entry.mood, delay);
        let mood_explanation = Debouncer::new(entry.mood_explanation.clone(), delay);
        let sections =
            SectionTag::ALL.map(|tag| Debouncer::new(Arc::clone(entry.sections.get(tag)), delay));
        let health = Debouncer::new(Arc::clone(&entry.health), delay);

        let [morning, afternoon, evening] = &sections;
        let inputs = AutosaveInputs {
            gate: gate.clone(),
            installed: installed_tx.subscribe(),
            mood: mood.subscribe(),
            mood_explanation: mood_explanation.subscribe(),
            morning: morning.subscribe(),
            afternoon: afternoon.subscribe(),
            evening: evening.subscribe(),
            health: health.subscribe(),
            achievements: achievements_tx.subscribe(),
        };
        let autosave = AutosaveCoordinator::new(Arc::clone(&gateway), notifier.clone());
        let autosave_task = autosave.spawn(inputs);

        Self {
            store: FormStore::new(entry),
            gateway,
            gate,
            installed_tx,
            mood,
            mood_explanation,
            sections,
            health,
            achievements_tx,
            autosave,
            autosave_task,
            notifier,
        }
    }

    pub fn entry(&self) -> &Entry {
        self.store.entry()
    }

    pub fn date(&self) -> CalendarDate {
        self.store.date()
    }

    /// Applies one edit and schedules its autosave.
    pub fn apply(&mut self, mutation: EntryMutation) {
        let group = self.store.apply(mutation);
        self.publish(group);
    }

    /// Enables or disables an activity in one section.
    pub fn toggle_activity(&mut self, tag: SectionTag, activity: Activity, enabled: bool) {
        self.toggle_activity_with(tag, activity, enabled, &mut rand::thread_rng());
    }

    /// Same as [`Journal::toggle_activity`] with a caller-provided RNG.
    pub fn toggle_activity_with<R: Rng + ?Sized>(
        &mut self,
        tag: SectionTag,
        activity: Activity,
        enabled: bool,
        rng: &mut R,
    ) {
        let group = self.store.toggle_activity(tag, activity, enabled, rng);
        self.publish(group);
    }

    /// Lists the reflection prompts shown for `activity` in section `tag`.
    pub fn questions_for(
        &self,
        tag: SectionTag,
        activity: Activity,
    ) -> Vec<(ActivityNoteKey, &'static str)> {
        self.store.questions_for(tag, activity)
    }

    /// Switches the session to `date`.
    ///
    /// Edits made on the previous date are saved under that date first.
    /// The new entry is installed only after the load resolved; a missing
    /// or failed load yields the defaults.
    pub async fn select_date(&mut self, date: CalendarDate) {
        let previous = self.store.date();
        if self.store.is_dirty() {
            debug!("event=journal_flush module=journal status=ok date={previous}");
            self.autosave.save_now(previous, self.store.entry().clone());
        }
        let current = self.store.entry().clone();
        self.install_channels(&current);

        let record = self.gateway.load(date, LoadPath::DateSelected).await;
        let entry = load_entry(date, record.as_ref(), LoadPath::DateSelected);
        info!(
            "event=journal_select_date module=journal status=ok from={previous} to={date} found={}",
            record.is_some()
        );
        self.install_channels(&entry);
        self.store.replace(entry);
    }

    /// Moves to the day before the active date.
    ///
    /// Returns `false` without loading when no earlier date exists.
    pub async fn select_previous_day(&mut self) -> bool {
        match self.date().pred_opt() {
            Some(date) => {
                self.select_date(date).await;
                true
            }
            None => false,
        }
    }

    /// Moves to the day after the active date.
    ///
    /// Returns `false` without loading when no later date exists.
    pub async fn select_next_day(&mut self) -> bool {
        match self.date().succ_opt() {
            Some(date) => {
                self.select_date(date).await;
                true
            }
            None => false,
        }
    }

    /// Subscribes to save notifications.
    pub fn notifications(&self) -> watch::Receiver<Option<Notification>> {
        self.notifier.subscribe()
    }

    pub fn current_notification(&self) -> Option<Notification> {
        self.notifier.current()
    }

    pub fn autosave_state(&self) -> AutosaveState {
        self.autosave.state()
    }

    /// Returns whether some edit is still waiting for its quiet period.
    pub fn has_pending_edits(&self) -> bool {
        self.mood.is_pending()
            || self.mood_explanation.is_pending()
            || self.sections.iter().any(Debouncer::is_pending)
            || self.health.is_pending()
    }

    fn publish(&mut self, group: FieldGroup) {
        let entry = self.store.entry();
        match group {
            FieldGroup::Mood => self.mood.push(entry.mood),
            FieldGroup::MoodExplanation => {
                self.mood_explanation.push(entry.mood_explanation.clone())
            }
            FieldGroup::Section(tag) => {
                self.sections[tag.index()].push(Arc::clone(entry.sections.get(tag)))
            }
            FieldGroup::Health => self.health.push(Arc::clone(&entry.health)),
            FieldGroup::Achievements => {
                self.achievements_tx
                    .send_replace(Arc::clone(&entry.achievements));
            }
        }
    }

    fn cancel_pending(&mut self) {
        self.mood.cancel();
        self.mood_explanation.cancel();
        for debouncer in &mut self.sections {
            debouncer.cancel();
        }
        self.health.cancel();
    }

    /// Points every channel at `entry` without waking the coordinator for
    /// a save, and drops any pending debounce timer.
    fn install_channels(&mut self, entry: &Entry) {
        let _gate = self.gate.lock();
        self.mood.reset(entry.mood);
        self.mood_explanation.reset(entry.mood_explanation.clone());
        for (tag, section) in entry.sections.iter() {
            self.sections[tag.index()].reset(Arc::clone(section));
        }
        self.health.reset(Arc::clone(&entry.health));
        let achievements = Arc::clone(&entry.achievements);
        self.achievements_tx.send_if_modified(|current| {
            *current = achievements;
            false
        });
        self.installed_tx.send_replace(entry.clone());
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        self.autosave_task.abort();
        self.cancel_pending();
    }
}
