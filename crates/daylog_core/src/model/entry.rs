//! Daily entry domain model.
//!
//! # Responsibility
//! - Define the canonical per-date record edited by the journal form.
//! - Provide wire names shared by storage and JSON export.
//!
//! # Invariants
//! - One `Entry` exists per calendar date; `date` is its persistence key.
//! - An entry always carries exactly three sections, one per `SectionTag`.
//! - Branches live behind `Arc` so a mutation replaces only the touched
//!   branch and siblings keep pointer identity.
//! - Persisted row ids never appear here; they are owned by storage.
//!
//! # See also
//! - crate::model::mutation

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Calendar day used as the unique persistence key.
pub type CalendarDate = NaiveDate;

/// Overall mood for the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Great,
    #[default]
    Okay,
    #[serde(rename = "Not Good")]
    NotGood,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Great, Mood::Okay, Mood::NotGood];

    /// Stable wire text used by storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Great => "Great",
            Self::Okay => "Okay",
            Self::NotGood => "Not Good",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mood| mood.as_str() == value)
    }
}

/// How much of a meal was eaten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealAmount {
    #[default]
    All,
    Most,
    Half,
    Little,
}

impl MealAmount {
    pub const ALL: [MealAmount; 4] = [
        MealAmount::All,
        MealAmount::Most,
        MealAmount::Half,
        MealAmount::Little,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Most => "Most",
            Self::Half => "Half",
            Self::Little => "Little",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|amount| amount.as_str() == value)
    }
}

/// Rough length of a seizure episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeizureDuration {
    #[default]
    Short,
    Medium,
    Long,
}

impl SeizureDuration {
    pub const ALL: [SeizureDuration; 3] = [
        SeizureDuration::Short,
        SeizureDuration::Medium,
        SeizureDuration::Long,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "Short",
            Self::Medium => "Medium",
            Self::Long => "Long",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|duration| duration.as_str() == value)
    }
}

/// Activity tag selectable inside a time section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Activity {
    Exercise,
    #[serde(rename = "TV")]
    Tv,
    Reading,
    Learning,
    Other,
}

impl Activity {
    pub const ALL: [Activity; 5] = [
        Activity::Exercise,
        Activity::Tv,
        Activity::Reading,
        Activity::Learning,
        Activity::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exercise => "Exercise",
            Self::Tv => "TV",
            Self::Reading => "Reading",
            Self::Learning => "Learning",
            Self::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|activity| activity.as_str() == value)
    }
}

/// Time-of-day tag identifying one of the three sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    Morning,
    Afternoon,
    Evening,
}

impl SectionTag {
    pub const ALL: [SectionTag; 3] = [
        SectionTag::Morning,
        SectionTag::Afternoon,
        SectionTag::Evening,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == value)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Afternoon => 1,
            Self::Evening => 2,
        }
    }
}

/// Composite key `(activity, prompt index)` for one prompt answer.
///
/// Text form is `<Activity>_<index>` (e.g. `Reading_4`), which is also the
/// JSON object key used in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActivityNoteKey {
    pub activity: Activity,
    pub prompt_index: u8,
}

impl ActivityNoteKey {
    pub fn new(activity: Activity, prompt_index: u8) -> Self {
        Self {
            activity,
            prompt_index,
        }
    }
}

impl Display for ActivityNoteKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.activity.as_str(), self.prompt_index)
    }
}

impl FromStr for ActivityNoteKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (activity, index) = value
            .rsplit_once('_')
            .ok_or_else(|| format!("activity note key `{value}` has no `_` separator"))?;
        let activity = Activity::parse(activity)
            .ok_or_else(|| format!("unknown activity `{activity}` in note key `{value}`"))?;
        let prompt_index = index
            .parse::<u8>()
            .map_err(|_| format!("invalid prompt index `{index}` in note key `{value}`"))?;
        Ok(Self::new(activity, prompt_index))
    }
}

impl Serialize for ActivityNoteKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActivityNoteKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Answers to activity prompts keyed by `(activity, prompt index)`.
pub type ActivityNotes = BTreeMap<ActivityNoteKey, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub time_taken: Option<NaiveTime>,
    pub taken: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub time: Option<NaiveTime>,
    pub items: String,
    pub amount: MealAmount,
}

/// Morning/afternoon/evening sub-record.
///
/// Notes of an activity may outlive its tag in `activities`; orphaned notes
/// are kept, not treated as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSection {
    pub time: Option<NaiveTime>,
    pub medicine: Medicine,
    pub meal: Meal,
    pub activities: BTreeSet<Activity>,
    pub activity_notes: ActivityNotes,
}

impl TimeSection {
    /// Returns whether any note exists for `activity`.
    pub fn has_notes_for(&self, activity: Activity) -> bool {
        self.activity_notes
            .keys()
            .any(|key| key.activity == activity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seizures {
    pub count: u32,
    pub times: String,
    pub duration: SeizureDuration,
}

/// Fall log. `description` is only surfaced while `injuries` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Falls {
    pub count: u32,
    pub times: String,
    pub injuries: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub seizures: Seizures,
    pub falls: Falls,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub learned: String,
    pub proud: String,
    pub help: String,
    pub notes: String,
}

/// The three time sections of one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    pub morning: Arc<TimeSection>,
    pub afternoon: Arc<TimeSection>,
    pub evening: Arc<TimeSection>,
}

impl Sections {
    pub fn get(&self, tag: SectionTag) -> &Arc<TimeSection> {
        match tag {
            SectionTag::Morning => &self.morning,
            SectionTag::Afternoon => &self.afternoon,
            SectionTag::Evening => &self.evening,
        }
    }

    pub fn get_mut(&mut self, tag: SectionTag) -> &mut Arc<TimeSection> {
        match tag {
            SectionTag::Morning => &mut self.morning,
            SectionTag::Afternoon => &mut self.afternoon,
            SectionTag::Evening => &mut self.evening,
        }
    }

    /// Iterates sections in `SectionTag::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionTag, &Arc<TimeSection>)> {
        SectionTag::ALL.into_iter().map(move |tag| (tag, self.get(tag)))
    }
}

/// Full daily record for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub date: CalendarDate,
    pub mood: Mood,
    pub mood_explanation: String,
    pub sections: Sections,
    pub health: Arc<HealthRecord>,
    pub achievements: Arc<AchievementRecord>,
}

impl Entry {
    /// Creates an entry holding the documented type defaults.
    ///
    /// # Invariants
    /// - `mood` is `Okay`, all text is empty, all counts are zero.
    /// - Every section has no times, no activities and no notes.
    pub fn new(date: CalendarDate) -> Self {
        Self {
            date,
            mood: Mood::default(),
            mood_explanation: String::new(),
            sections: Sections::default(),
            health: Arc::default(),
            achievements: Arc::default(),
        }
    }

    pub fn section(&self, tag: SectionTag) -> &TimeSection {
        self.sections.get(tag)
    }
}

/// Drops seconds and sub-seconds; clock fields hold minutes only.
pub fn clock_minute(value: Option<NaiveTime>) -> Option<NaiveTime> {
    value.and_then(|time| NaiveTime::from_hms_opt(time.hour(), time.minute(), 0))
}

/// Formats an optional clock time as stored text (`HH:MM`).
pub fn clock_to_text(value: Option<NaiveTime>) -> Option<String> {
    value.map(|time| time.format("%H:%M").to_string())
}

/// Parses stored clock text, coercing empty or malformed text to `None`.
pub fn clock_from_text(value: Option<&str>) -> Option<NaiveTime> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok();
    clock_minute(parsed)
}
