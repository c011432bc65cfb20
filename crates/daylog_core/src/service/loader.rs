//! Stored payload to in-memory entry conversion for date changes.
//!
//! # Responsibility
//! - Build a complete `Entry` for a date from a gateway payload, or the
//!   documented defaults when nothing was returned.
//!
//! # Invariants
//! - Merging is per branch, not deep: a returned section row overwrites
//!   every field of that section, and fields missing from the row take
//!   their type default.
//! - Sections, health and achievements absent from the payload keep the
//!   defaults of the fresh entry.
//! - Achievements are populated only for `LoadPath::DateSelected`.
//! - Unknown enum text coerces to the type default with a warning.

use crate::gateway::LoadPath;
use crate::model::entry::{
    clock_from_text, AchievementRecord, Activity, ActivityNoteKey, CalendarDate, Entry, Falls,
    HealthRecord, Meal, MealAmount, Medicine, Mood, SectionTag, SeizureDuration, Seizures,
    TimeSection,
};
use crate::repo::journal_repo::{AchievementRow, HealthRecordRow, JournalRecord, TimeSectionRow};
use log::warn;
use std::sync::Arc;

/// Builds the entry shown after loading `date`.
pub fn load_entry(date: CalendarDate, record: Option<&JournalRecord>, path: LoadPath) -> Entry {
    match record {
        Some(record) => entry_from_record(date, record, path),
        None => Entry::new(date),
    }
}

/// Builds an entry from a stored payload.
pub fn entry_from_record(date: CalendarDate, record: &JournalRecord, path: LoadPath) -> Entry {
    let mut entry = Entry::new(date);
    entry.mood = Mood::parse(&record.mood).unwrap_or_else(|| {
        warn!(
            "event=journal_coerce module=loader status=warn field=mood value={:?}",
            record.mood
        );
        Mood::default()
    });
    entry.mood_explanation = record.mood_explanation.clone().unwrap_or_default();

    for row in &record.time_sections {
        match SectionTag::parse(&row.section_type) {
            Some(tag) => *entry.sections.get_mut(tag) = Arc::new(section_from_row(row)),
            None => warn!(
                "event=journal_coerce module=loader status=warn field=section_type value={:?}",
                row.section_type
            ),
        }
    }

    if let Some(row) = record.health_records.first() {
        entry.health = Arc::new(health_from_row(row));
    }

    if path.includes_achievements() {
        if let Some(row) = record.achievements.first() {
            entry.achievements = Arc::new(achievements_from_row(row));
        }
    }

    entry
}

pub fn section_from_row(row: &TimeSectionRow) -> TimeSection {
    let amount = match row.meal_amount.as_deref() {
        None => MealAmount::default(),
        Some(text) => MealAmount::parse(text).unwrap_or_else(|| {
            warn!(
                "event=journal_coerce module=loader status=warn field=meal_amount value={text:?}"
            );
            MealAmount::default()
        }),
    };

    let activities = row
        .activities
        .iter()
        .filter_map(|name| {
            let parsed = Activity::parse(name);
            if parsed.is_none() {
                warn!("event=journal_coerce module=loader status=warn field=activities value={name:?}");
            }
            parsed
        })
        .collect();

    let activity_notes = row
        .activity_notes
        .iter()
        .filter_map(|(key, answer)| match key.parse::<ActivityNoteKey>() {
            Ok(key) => Some((key, answer.clone())),
            Err(err) => {
                warn!("event=journal_coerce module=loader status=warn field=activity_notes error={err}");
                None
            }
        })
        .collect();

    TimeSection {
        time: clock_from_text(row.time.as_deref()),
        medicine: Medicine {
            time_taken: clock_from_text(row.medicine_time.as_deref()),
            taken: row.medicine_taken,
        },
        meal: Meal {
            time: clock_from_text(row.meal_time.as_deref()),
            items: row.meal_items.clone().unwrap_or_default(),
            amount,
        },
        activities,
        activity_notes,
    }
}

pub fn health_from_row(row: &HealthRecordRow) -> HealthRecord {
    let duration = match row.seizure_duration.as_deref() {
        None => SeizureDuration::default(),
        Some(text) => SeizureDuration::parse(text).unwrap_or_else(|| {
            warn!(
                "event=journal_coerce module=loader status=warn field=seizure_duration value={text:?}"
            );
            SeizureDuration::default()
        }),
    };

    HealthRecord {
        seizures: Seizures {
            count: count_from_db(row.seizure_count),
            times: row.seizure_times.clone().unwrap_or_default(),
            duration,
        },
        falls: Falls {
            count: count_from_db(row.fall_count),
            times: row.fall_times.clone().unwrap_or_default(),
            injuries: row.fall_injuries,
            description: row.injury_description.clone().unwrap_or_default(),
        },
    }
}

pub fn achievements_from_row(row: &AchievementRow) -> AchievementRecord {
    AchievementRecord {
        learned: row.learned.clone().unwrap_or_default(),
        proud: row.proud.clone().unwrap_or_default(),
        help: row.help.clone().unwrap_or_default(),
        notes: row.notes.clone().unwrap_or_default(),
    }
}

fn count_from_db(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(if value < 0 { 0 } else { u32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn date() -> CalendarDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn record() -> JournalRecord {
        JournalRecord {
            id: Uuid::new_v4(),
            user_id: None,
            date: date(),
            mood: "Great".to_string(),
            mood_explanation: None,
            time_sections: Vec::new(),
            health_records: Vec::new(),
            achievements: vec![AchievementRow {
                learned: Some("knots".to_string()),
                ..AchievementRow::default()
            }],
        }
    }

    #[test]
    fn missing_payload_yields_defaults() {
        let entry = load_entry(date(), None, LoadPath::DateSelected);
        assert_eq!(entry, Entry::new(date()));
    }

    #[test]
    fn section_row_overwrites_whole_section_with_defaults_for_missing_fields() {
        let mut payload = record();
        let mut notes = BTreeMap::new();
        notes.insert("Reading_3".to_string(), "a novel".to_string());
        notes.insert("bogus".to_string(), "dropped".to_string());
        payload.time_sections.push(TimeSectionRow {
            section_type: "evening".to_string(),
            time: Some("19:45".to_string()),
            meal_amount: Some("Plenty".to_string()),
            activities: vec!["Reading".to_string(), "Knitting".to_string()],
            activity_notes: notes,
            ..TimeSectionRow::default()
        });

        let entry = entry_from_record(date(), &payload, LoadPath::DateSelected);
        let evening = entry.section(SectionTag::Evening);

        assert_eq!(evening.time, clock_from_text(Some("19:45")));
        assert_eq!(evening.medicine, Medicine::default());
        assert_eq!(evening.meal.items, "");
        assert_eq!(evening.meal.amount, MealAmount::All);
        assert_eq!(evening.activities.len(), 1);
        assert!(evening.activities.contains(&Activity::Reading));
        assert_eq!(evening.activity_notes.len(), 1);
        assert_eq!(*entry.sections.morning, TimeSection::default());
    }

    #[test]
    fn unknown_mood_coerces_to_okay() {
        let mut payload = record();
        payload.mood = "Ecstatic".to_string();
        let entry = entry_from_record(date(), &payload, LoadPath::DateSelected);
        assert_eq!(entry.mood, Mood::Okay);
    }

    #[test]
    fn achievements_only_follow_explicit_date_selection() {
        let payload = record();

        let selected = entry_from_record(date(), &payload, LoadPath::DateSelected);
        assert_eq!(selected.achievements.learned, "knots");

        let automatic = entry_from_record(date(), &payload, LoadPath::Automatic);
        assert_eq!(*automatic.achievements, AchievementRecord::default());
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        let row = HealthRecordRow {
            seizure_count: -3,
            fall_count: 2,
            ..HealthRecordRow::default()
        };
        let health = health_from_row(&row);
        assert_eq!(health.seizures.count, 0);
        assert_eq!(health.falls.count, 2);
        assert_eq!(health.seizures.duration, SeizureDuration::Short);
    }
}
