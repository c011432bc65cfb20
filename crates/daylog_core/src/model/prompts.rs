//! Activity prompt bank and per-section prompt selection.
//!
//! # Responsibility
//! - Hold the fixed prompt bank (6 prompts per activity).
//! - Seed prompt answers the first time an activity is enabled.
//!
//! # Invariants
//! - Selection samples `PROMPTS_PER_SELECTION` distinct indices.
//! - Re-enabling an activity within the same section instance never
//!   reselects prompts.
//! - Disabling an activity never removes its notes.
//! - Seeding never overwrites an existing answer.

use crate::model::entry::{Activity, ActivityNoteKey, ActivityNotes, TimeSection};
use rand::seq::index;
use rand::Rng;
use std::collections::BTreeSet;

/// Number of prompts in each activity bank.
pub const PROMPT_BANK_SIZE: usize = 6;
/// Number of prompts drawn on first enable.
pub const PROMPTS_PER_SELECTION: usize = 3;

const EXERCISE_PROMPTS: [&str; PROMPT_BANK_SIZE] = [
    "What exercises did you do today?",
    "How long did you exercise for?",
    "How did you feel during the exercise?",
    "Did you try any new exercises?",
    "What was your favorite part of the workout?",
    "Did you achieve any fitness goals today?",
];

const TV_PROMPTS: [&str; PROMPT_BANK_SIZE] = [
    "What did you watch?",
    "What was your favorite part?",
    "Would you recommend it to others? Why?",
    "How did it make you feel?",
    "Did you learn anything new from what you watched?",
    "Who was your favorite character and why?",
];

const READING_PROMPTS: [&str; PROMPT_BANK_SIZE] = [
    "What are you reading?",
    "What's the most interesting thing you've read so far?",
    "How does the story make you feel?",
    "Would you recommend this book/article?",
    "What have you learned from your reading?",
    "Who is your favorite character and why?",
];

const LEARNING_PROMPTS: [&str; PROMPT_BANK_SIZE] = [
    "What did you learn about today?",
    "What was the most interesting thing you learned?",
    "How will you apply what you learned?",
    "What made you choose this topic?",
    "Would you like to learn more about this subject?",
    "Did anything surprise you while learning?",
];

const OTHER_PROMPTS: [&str; PROMPT_BANK_SIZE] = [
    "What activity did you do?",
    "How long did you spend on this activity?",
    "Why did you choose to do this activity?",
    "How did it make you feel?",
    "Would you do this activity again?",
    "What did you enjoy most about it?",
];

/// Returns the full prompt bank for `activity`.
pub fn prompt_bank(activity: Activity) -> &'static [&'static str; PROMPT_BANK_SIZE] {
    match activity {
        Activity::Exercise => &EXERCISE_PROMPTS,
        Activity::Tv => &TV_PROMPTS,
        Activity::Reading => &READING_PROMPTS,
        Activity::Learning => &LEARNING_PROMPTS,
        Activity::Other => &OTHER_PROMPTS,
    }
}

/// Returns the prompt text behind a note key, if the index is in range.
pub fn prompt_text(key: ActivityNoteKey) -> Option<&'static str> {
    prompt_bank(key.activity)
        .get(usize::from(key.prompt_index))
        .copied()
}

/// Lists `(key, prompt)` pairs for the notes present for `activity`,
/// ordered by prompt index. Keys with out-of-range indices are skipped.
pub fn questions_for(
    section: &TimeSection,
    activity: Activity,
) -> Vec<(ActivityNoteKey, &'static str)> {
    section
        .activity_notes
        .keys()
        .filter(|key| key.activity == activity)
        .filter_map(|key| prompt_text(*key).map(|text| (*key, text)))
        .collect()
}

/// Result of toggling one activity checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityToggle {
    /// Activity set after the toggle.
    pub activities: BTreeSet<Activity>,
    /// Note map with freshly seeded keys, only on first enable.
    pub seeded_notes: Option<ActivityNotes>,
}

/// Remembers which activities already had prompts generated in one
/// section instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptTracker {
    generated_for: BTreeSet<Activity>,
}

impl PromptTracker {
    /// Creates a tracker primed with activities that already carry notes.
    pub fn primed_from(section: &TimeSection) -> Self {
        let generated_for = section
            .activity_notes
            .keys()
            .map(|key| key.activity)
            .collect();
        Self { generated_for }
    }

    pub fn has_generated(&self, activity: Activity) -> bool {
        self.generated_for.contains(&activity)
    }

    /// Computes the state change for enabling/disabling `activity`.
    pub fn toggle<R: Rng + ?Sized>(
        &mut self,
        section: &TimeSection,
        activity: Activity,
        enabled: bool,
        rng: &mut R,
    ) -> ActivityToggle {
        let mut activities = section.activities.clone();
        if !enabled {
            activities.remove(&activity);
            return ActivityToggle {
                activities,
                seeded_notes: None,
            };
        }

        activities.insert(activity);
        if !self.generated_for.insert(activity) {
            return ActivityToggle {
                activities,
                seeded_notes: None,
            };
        }

        let mut notes = section.activity_notes.clone();
        for prompt_index in select_prompt_indices(rng) {
            notes
                .entry(ActivityNoteKey::new(activity, prompt_index))
                .or_default();
        }
        ActivityToggle {
            activities,
            seeded_notes: Some(notes),
        }
    }
}

/// Samples distinct prompt indices without replacement, ascending.
pub fn select_prompt_indices<R: Rng + ?Sized>(rng: &mut R) -> Vec<u8> {
    let mut picked: Vec<u8> = index::sample(rng, PROMPT_BANK_SIZE, PROMPTS_PER_SELECTION)
        .into_iter()
        .filter_map(|value| u8::try_from(value).ok())
        .collect();
    picked.sort_unstable();
    picked
}
