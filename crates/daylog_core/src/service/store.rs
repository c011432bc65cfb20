//! In-memory form state for the active date.
//!
//! # Responsibility
//! - Own the single mutable `Entry` and the per-section prompt trackers.
//! - Route every edit through the entry reducer.
//!
//! # Invariants
//! - The entry is replaced wholesale on date change; trackers are rebuilt
//!   from the new entry at the same time.
//! - Edits are synchronous and infallible.

use crate::model::entry::{Activity, ActivityNoteKey, CalendarDate, Entry, SectionTag};
use crate::model::mutation::{EntryMutation, FieldGroup, SectionField};
use crate::model::prompts::{questions_for, PromptTracker};
use rand::Rng;

#[derive(Debug, Clone)]
pub struct FormStore {
    entry: Entry,
    trackers: [PromptTracker; 3],
    dirty: bool,
}

impl FormStore {
    pub fn new(entry: Entry) -> Self {
        let trackers = primed_trackers(&entry);
        Self {
            entry,
            trackers,
            dirty: false,
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn date(&self) -> CalendarDate {
        self.entry.date
    }

    /// Returns whether any edit happened since the entry was installed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn apply(&mut self, mutation: EntryMutation) -> FieldGroup {
        self.dirty = true;
        self.entry.apply(mutation)
    }

    /// Enables or disables one activity, seeding prompts on first enable.
    pub fn toggle_activity<R: Rng + ?Sized>(
        &mut self,
        tag: SectionTag,
        activity: Activity,
        enabled: bool,
        rng: &mut R,
    ) -> FieldGroup {
        let toggle = self.trackers[tag.index()].toggle(
            self.entry.section(tag),
            activity,
            enabled,
            rng,
        );
        let group = self.apply(EntryMutation::Section(
            tag,
            SectionField::Activities(toggle.activities),
        ));
        if let Some(notes) = toggle.seeded_notes {
            self.apply(EntryMutation::Section(tag, SectionField::ActivityNotes(notes)));
        }
        group
    }

    /// Lists the prompts shown for `activity` in section `tag`.
    pub fn questions_for(
        &self,
        tag: SectionTag,
        activity: Activity,
    ) -> Vec<(ActivityNoteKey, &'static str)> {
        questions_for(self.entry.section(tag), activity)
    }

    /// Installs a freshly loaded entry, discarding the previous one.
    pub fn replace(&mut self, entry: Entry) {
        self.trackers = primed_trackers(&entry);
        self.entry = entry;
        self.dirty = false;
    }
}

fn primed_trackers(entry: &Entry) -> [PromptTracker; 3] {
    SectionTag::ALL.map(|tag| PromptTracker::primed_from(entry.section(tag)))
}

#[cfg(test)]
mod tests {
    use super::FormStore;
    use crate::model::entry::{Activity, Entry, SectionTag};
    use crate::model::mutation::{EntryMutation, FieldGroup};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store() -> FormStore {
        FormStore::new(Entry::new(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
    }

    #[test]
    fn reenable_keeps_first_selection_and_disable_keeps_notes() {
        let mut store = store();
        let mut rng = StdRng::seed_from_u64(42);

        store.toggle_activity(SectionTag::Morning, Activity::Exercise, true, &mut rng);
        let first: Vec<_> = store
            .entry()
            .section(SectionTag::Morning)
            .activity_notes
            .keys()
            .copied()
            .collect();
        assert_eq!(first.len(), 3);

        store.toggle_activity(SectionTag::Morning, Activity::Exercise, false, &mut rng);
        let morning = store.entry().section(SectionTag::Morning);
        assert!(!morning.activities.contains(&Activity::Exercise));
        assert_eq!(morning.activity_notes.keys().copied().collect::<Vec<_>>(), first);

        store.toggle_activity(SectionTag::Morning, Activity::Exercise, true, &mut rng);
        let morning = store.entry().section(SectionTag::Morning);
        assert!(morning.activities.contains(&Activity::Exercise));
        assert_eq!(morning.activity_notes.keys().copied().collect::<Vec<_>>(), first);
    }

    #[test]
    fn trackers_are_per_section() {
        let mut store = store();
        let mut rng = StdRng::seed_from_u64(1);

        store.toggle_activity(SectionTag::Morning, Activity::Tv, true, &mut rng);
        let group = store.toggle_activity(SectionTag::Evening, Activity::Tv, true, &mut rng);

        assert_eq!(group, FieldGroup::Section(SectionTag::Evening));
        assert_eq!(store.questions_for(SectionTag::Evening, Activity::Tv).len(), 3);
        assert_eq!(store.questions_for(SectionTag::Afternoon, Activity::Tv).len(), 0);
    }

    #[test]
    fn replace_clears_dirty_flag_and_rebuilds_trackers() {
        let mut store = store();
        store.apply(EntryMutation::SetMoodExplanation("tired".to_string()));
        assert!(store.is_dirty());

        let next = Entry::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        store.replace(next.clone());

        assert!(!store.is_dirty());
        assert_eq!(store.entry(), &next);
    }
}
