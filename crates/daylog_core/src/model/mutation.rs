//! Typed field mutations and the single entry reducer.
//!
//! # Responsibility
//! - Enumerate every leaf the form can edit as a closed set of variants.
//! - Apply one mutation to an `Entry`, replacing only the touched leaf.
//!
//! # Invariants
//! - `Entry::apply` always succeeds and performs no validation.
//! - Clock fields are truncated to the minute, matching what storage keeps.
//! - Only the branch that owns the leaf gets a new `Arc`; siblings keep
//!   pointer identity so consumers can detect changes shallowly.

use crate::model::entry::{
    clock_minute, Activity, ActivityNoteKey, ActivityNotes, Entry, MealAmount, Mood,
    SeizureDuration, SectionTag,
};
use chrono::NaiveTime;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Leaf inside one time section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionField {
    Time(Option<NaiveTime>),
    MedicineTimeTaken(Option<NaiveTime>),
    MedicineTaken(bool),
    MealTime(Option<NaiveTime>),
    MealItems(String),
    MealAmount(MealAmount),
    /// Replaces the whole activity set.
    Activities(BTreeSet<Activity>),
    /// Sets one prompt answer, creating the key when missing.
    ActivityNote(ActivityNoteKey, String),
    /// Replaces the whole note map.
    ActivityNotes(ActivityNotes),
}

/// Leaf inside the health record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthField {
    SeizureCount(u32),
    SeizureTimes(String),
    SeizureDuration(SeizureDuration),
    FallCount(u32),
    FallTimes(String),
    FallInjuries(bool),
    InjuryDescription(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementField {
    Learned,
    Proud,
    Help,
    Notes,
}

/// One edit dispatched by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryMutation {
    SetMood(Mood),
    SetMoodExplanation(String),
    Section(SectionTag, SectionField),
    Health(HealthField),
    Achievement(AchievementField, String),
}

/// Independently watched slice of an entry.
///
/// Each group has its own debounce instance, except `Achievements`, which
/// is published to autosave immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Mood,
    MoodExplanation,
    Section(SectionTag),
    Health,
    Achievements,
}

impl FieldGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mood => "mood",
            Self::MoodExplanation => "mood_explanation",
            Self::Section(tag) => tag.as_str(),
            Self::Health => "health",
            Self::Achievements => "achievements",
        }
    }
}

impl Entry {
    /// Applies one mutation and reports which field group changed.
    pub fn apply(&mut self, mutation: EntryMutation) -> FieldGroup {
        match mutation {
            EntryMutation::SetMood(mood) => {
                self.mood = mood;
                FieldGroup::Mood
            }
            EntryMutation::SetMoodExplanation(text) => {
                self.mood_explanation = text;
                FieldGroup::MoodExplanation
            }
            EntryMutation::Section(tag, field) => {
                let section = Arc::make_mut(self.sections.get_mut(tag));
                match field {
                    SectionField::Time(value) => section.time = clock_minute(value),
                    SectionField::MedicineTimeTaken(value) => {
                        section.medicine.time_taken = clock_minute(value)
                    }
                    SectionField::MedicineTaken(value) => section.medicine.taken = value,
                    SectionField::MealTime(value) => section.meal.time = clock_minute(value),
                    SectionField::MealItems(value) => section.meal.items = value,
                    SectionField::MealAmount(value) => section.meal.amount = value,
                    SectionField::Activities(value) => section.activities = value,
                    SectionField::ActivityNote(key, value) => {
                        section.activity_notes.insert(key, value);
                    }
                    SectionField::ActivityNotes(value) => section.activity_notes = value,
                }
                FieldGroup::Section(tag)
            }
            EntryMutation::Health(field) => {
                let health = Arc::make_mut(&mut self.health);
                match field {
                    HealthField::SeizureCount(value) => health.seizures.count = value,
                    HealthField::SeizureTimes(value) => health.seizures.times = value,
                    HealthField::SeizureDuration(value) => health.seizures.duration = value,
                    HealthField::FallCount(value) => health.falls.count = value,
                    HealthField::FallTimes(value) => health.falls.times = value,
                    HealthField::FallInjuries(value) => health.falls.injuries = value,
                    HealthField::InjuryDescription(value) => health.falls.description = value,
                }
                FieldGroup::Health
            }
            EntryMutation::Achievement(field, value) => {
                let achievements = Arc::make_mut(&mut self.achievements);
                match field {
                    AchievementField::Learned => achievements.learned = value,
                    AchievementField::Proud => achievements.proud = value,
                    AchievementField::Help => achievements.help = value,
                    AchievementField::Notes => achievements.notes = value,
                }
                FieldGroup::Achievements
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entry::{clock_from_text, clock_to_text};
    use chrono::NaiveDate;

    fn entry() -> Entry {
        Entry::new(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap())
    }

    #[test]
    fn section_mutation_replaces_only_touched_branch() {
        let mut entry = entry();
        let before = entry.clone();

        let group = entry.apply(EntryMutation::Section(
            SectionTag::Afternoon,
            SectionField::MedicineTaken(true),
        ));

        assert_eq!(group, FieldGroup::Section(SectionTag::Afternoon));
        assert!(entry.section(SectionTag::Afternoon).medicine.taken);
        assert!(!before.section(SectionTag::Afternoon).medicine.taken);
        assert!(!Arc::ptr_eq(
            &entry.sections.afternoon,
            &before.sections.afternoon
        ));
        assert!(Arc::ptr_eq(&entry.sections.morning, &before.sections.morning));
        assert!(Arc::ptr_eq(&entry.sections.evening, &before.sections.evening));
        assert!(Arc::ptr_eq(&entry.health, &before.health));
        assert!(Arc::ptr_eq(&entry.achievements, &before.achievements));
    }

    #[test]
    fn health_mutation_keeps_sibling_leaves() {
        let mut entry = entry();
        entry.apply(EntryMutation::Health(HealthField::FallCount(2)));
        let group = entry.apply(EntryMutation::Health(HealthField::FallInjuries(true)));

        assert_eq!(group, FieldGroup::Health);
        assert_eq!(entry.health.falls.count, 2);
        assert!(entry.health.falls.injuries);
        assert_eq!(entry.health.seizures.count, 0);
    }

    #[test]
    fn activity_note_inserts_without_touching_other_notes() {
        let mut entry = entry();
        let first = ActivityNoteKey::new(Activity::Exercise, 1);
        let second = ActivityNoteKey::new(Activity::Exercise, 5);
        entry.apply(EntryMutation::Section(
            SectionTag::Morning,
            SectionField::ActivityNote(first, "a walk".into()),
        ));
        entry.apply(EntryMutation::Section(
            SectionTag::Morning,
            SectionField::ActivityNote(second, "yes".into()),
        ));

        let notes = &entry.section(SectionTag::Morning).activity_notes;
        assert_eq!(notes.get(&first).map(String::as_str), Some("a walk"));
        assert_eq!(notes.get(&second).map(String::as_str), Some("yes"));
    }

    #[test]
    fn clock_edits_keep_minute_precision() {
        let mut entry = entry();
        let typed = NaiveTime::from_hms_milli_opt(7, 45, 31, 250);
        entry.apply(EntryMutation::Section(
            SectionTag::Morning,
            SectionField::MealTime(typed),
        ));
        entry.apply(EntryMutation::Section(
            SectionTag::Morning,
            SectionField::MedicineTimeTaken(None),
        ));

        let morning = entry.section(SectionTag::Morning);
        assert_eq!(morning.meal.time, NaiveTime::from_hms_opt(7, 45, 0));
        assert_eq!(morning.medicine.time_taken, None);
        assert_eq!(
            clock_from_text(clock_to_text(morning.meal.time).as_deref()),
            morning.meal.time
        );
    }

    #[test]
    fn achievement_and_mood_groups_are_reported() {
        let mut entry = entry();
        assert_eq!(
            entry.apply(EntryMutation::Achievement(
                AchievementField::Proud,
                "finished a puzzle".into()
            )),
            FieldGroup::Achievements
        );
        assert_eq!(
            entry.apply(EntryMutation::SetMood(Mood::Great)),
            FieldGroup::Mood
        );
        assert_eq!(entry.achievements.proud, "finished a puzzle");
        assert_eq!(entry.mood, Mood::Great);
    }
}
