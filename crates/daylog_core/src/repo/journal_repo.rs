//! Journal repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist one entry per date across the journal header, three time
//!   sections, health record and achievements tables.
//! - Return the raw stored payload for a date; typed coercion happens in
//!   the loader.
//!
//! # Invariants
//! - `journals.date` is unique; saves look up the existing row id first
//!   and reuse it.
//! - Section rows are keyed by `(journal_id, section_type)`; health and
//!   achievement rows by `journal_id`. Upserts keep the existing row id.
//! - Sub-writes run as separate statements: the first failure aborts the
//!   remaining writes and earlier writes stay committed.
//! - Empty optional text is stored as `NULL`.

use crate::db::DbError;
use crate::model::entry::{
    clock_to_text, Activity, AchievementRecord, CalendarDate, Entry, HealthRecord, SectionTag,
    TimeSection,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stable id of a persisted journal header row.
pub type JournalId = Uuid;
/// Anonymous session user stamped on journal rows.
pub type UserId = Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for journal persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted journal data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Stored journal header plus its related rows, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    pub id: JournalId,
    pub user_id: Option<UserId>,
    pub date: CalendarDate,
    pub mood: String,
    pub mood_explanation: Option<String>,
    pub time_sections: Vec<TimeSectionRow>,
    pub health_records: Vec<HealthRecordRow>,
    /// Empty unless achievements were requested.
    pub achievements: Vec<AchievementRow>,
}

/// One `time_sections` row. Text stays as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSectionRow {
    pub section_type: String,
    pub time: Option<String>,
    pub medicine_time: Option<String>,
    pub medicine_taken: bool,
    pub meal_time: Option<String>,
    pub meal_items: Option<String>,
    pub meal_amount: Option<String>,
    pub activities: Vec<String>,
    pub activity_notes: BTreeMap<String, String>,
}

/// One `health_records` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthRecordRow {
    pub seizure_count: i64,
    pub seizure_times: Option<String>,
    pub seizure_duration: Option<String>,
    pub fall_count: i64,
    pub fall_times: Option<String>,
    pub fall_injuries: bool,
    pub injury_description: Option<String>,
}

/// One `achievements` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementRow {
    pub learned: Option<String>,
    pub proud: Option<String>,
    pub help: Option<String>,
    pub notes: Option<String>,
}

/// Repository interface for per-date journal persistence.
pub trait JournalRepository {
    /// Returns the header row id stored for `date`.
    fn find_journal_id(&self, date: CalendarDate) -> RepoResult<Option<JournalId>>;
    /// Loads the stored payload for `date`.
    fn load_journal(
        &self,
        date: CalendarDate,
        include_achievements: bool,
    ) -> RepoResult<Option<JournalRecord>>;
    /// Upserts every row of `entry` under `date`.
    ///
    /// Returns `None` when the header write produced no row.
    fn save_entry(
        &self,
        date: CalendarDate,
        entry: &Entry,
        user_id: Option<UserId>,
    ) -> RepoResult<Option<JournalId>>;
    /// Lists dates that have a stored journal, newest first.
    fn list_dates(&self) -> RepoResult<Vec<CalendarDate>>;
}

/// SQLite-backed journal repository.
pub struct SqliteJournalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["journals", "time_sections", "health_records", "achievements"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }

    fn upsert_journal(
        &self,
        id: JournalId,
        date: CalendarDate,
        entry: &Entry,
        user_id: Option<UserId>,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "INSERT INTO journals (id, user_id, date, mood, mood_explanation)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                user_id = COALESCE(excluded.user_id, journals.user_id),
                date = excluded.date,
                mood = excluded.mood,
                mood_explanation = excluded.mood_explanation,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                id.to_string(),
                user_id.map(|value| value.to_string()),
                date_to_db(date),
                entry.mood.as_str(),
                non_empty(&entry.mood_explanation),
            ],
        )?;
        Ok(changed)
    }

    fn upsert_section(
        &self,
        journal_id: JournalId,
        tag: SectionTag,
        section: &TimeSection,
    ) -> RepoResult<()> {
        let activities = encode_activities(&section.activities)?;
        let notes = encode_notes(section)?;
        self.conn.execute(
            "INSERT INTO time_sections (
                id,
                journal_id,
                section_type,
                time,
                medicine_time,
                medicine_taken,
                meal_time,
                meal_items,
                meal_amount,
                activities,
                activity_notes
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(journal_id, section_type) DO UPDATE SET
                time = excluded.time,
                medicine_time = excluded.medicine_time,
                medicine_taken = excluded.medicine_taken,
                meal_time = excluded.meal_time,
                meal_items = excluded.meal_items,
                meal_amount = excluded.meal_amount,
                activities = excluded.activities,
                activity_notes = excluded.activity_notes;",
            params![
                Uuid::new_v4().to_string(),
                journal_id.to_string(),
                tag.as_str(),
                clock_to_text(section.time),
                clock_to_text(section.medicine.time_taken),
                bool_to_int(section.medicine.taken),
                clock_to_text(section.meal.time),
                non_empty(&section.meal.items),
                section.meal.amount.as_str(),
                activities,
                notes,
            ],
        )?;
        Ok(())
    }

    fn upsert_health(&self, journal_id: JournalId, health: &HealthRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO health_records (
                id,
                journal_id,
                seizure_count,
                seizure_times,
                seizure_duration,
                fall_count,
                fall_times,
                fall_injuries,
                injury_description
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(journal_id) DO UPDATE SET
                seizure_count = excluded.seizure_count,
                seizure_times = excluded.seizure_times,
                seizure_duration = excluded.seizure_duration,
                fall_count = excluded.fall_count,
                fall_times = excluded.fall_times,
                fall_injuries = excluded.fall_injuries,
                injury_description = excluded.injury_description;",
            params![
                Uuid::new_v4().to_string(),
                journal_id.to_string(),
                i64::from(health.seizures.count),
                non_empty(&health.seizures.times),
                health.seizures.duration.as_str(),
                i64::from(health.falls.count),
                non_empty(&health.falls.times),
                bool_to_int(health.falls.injuries),
                non_empty(&health.falls.description),
            ],
        )?;
        Ok(())
    }

    fn upsert_achievements(
        &self,
        journal_id: JournalId,
        achievements: &AchievementRecord,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO achievements (id, journal_id, learned, proud, help, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(journal_id) DO UPDATE SET
                learned = excluded.learned,
                proud = excluded.proud,
                help = excluded.help,
                notes = excluded.notes;",
            params![
                Uuid::new_v4().to_string(),
                journal_id.to_string(),
                non_empty(&achievements.learned),
                non_empty(&achievements.proud),
                non_empty(&achievements.help),
                non_empty(&achievements.notes),
            ],
        )?;
        Ok(())
    }

    fn load_sections(&self, journal_id: &str) -> RepoResult<Vec<TimeSectionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                section_type,
                time,
                medicine_time,
                medicine_taken,
                meal_time,
                meal_items,
                meal_amount,
                activities,
                activity_notes
             FROM time_sections
             WHERE journal_id = ?1
             ORDER BY section_type ASC;",
        )?;
        let mut rows = stmt.query([journal_id])?;
        let mut sections = Vec::new();
        while let Some(row) = rows.next()? {
            sections.push(parse_section_row(row)?);
        }
        Ok(sections)
    }

    fn load_health(&self, journal_id: &str) -> RepoResult<Vec<HealthRecordRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                seizure_count,
                seizure_times,
                seizure_duration,
                fall_count,
                fall_times,
                fall_injuries,
                injury_description
             FROM health_records
             WHERE journal_id = ?1;",
        )?;
        let mut rows = stmt.query([journal_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(HealthRecordRow {
                seizure_count: row.get("seizure_count")?,
                seizure_times: row.get("seizure_times")?,
                seizure_duration: row.get("seizure_duration")?,
                fall_count: row.get("fall_count")?,
                fall_times: row.get("fall_times")?,
                fall_injuries: int_to_bool(row.get("fall_injuries")?, "fall_injuries")?,
                injury_description: row.get("injury_description")?,
            });
        }
        Ok(records)
    }

    fn load_achievements(&self, journal_id: &str) -> RepoResult<Vec<AchievementRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT learned, proud, help, notes
             FROM achievements
             WHERE journal_id = ?1;",
        )?;
        let mut rows = stmt.query([journal_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(AchievementRow {
                learned: row.get("learned")?,
                proud: row.get("proud")?,
                help: row.get("help")?,
                notes: row.get("notes")?,
            });
        }
        Ok(records)
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn find_journal_id(&self, date: CalendarDate) -> RepoResult<Option<JournalId>> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM journals WHERE date = ?1;",
                [date_to_db(date)],
                |row| row.get(0),
            )
            .optional()?;
        id.as_deref().map(parse_uuid).transpose()
    }

    fn load_journal(
        &self,
        date: CalendarDate,
        include_achievements: bool,
    ) -> RepoResult<Option<JournalRecord>> {
        let header = self
            .conn
            .query_row(
                "SELECT id, user_id, mood, mood_explanation
                 FROM journals
                 WHERE date = ?1;",
                [date_to_db(date)],
                |row| {
                    Ok((
                        row.get::<_, String>("id")?,
                        row.get::<_, Option<String>>("user_id")?,
                        row.get::<_, String>("mood")?,
                        row.get::<_, Option<String>>("mood_explanation")?,
                    ))
                },
            )
            .optional()?;

        let Some((id_text, user_text, mood, mood_explanation)) = header else {
            return Ok(None);
        };

        let achievements = if include_achievements {
            self.load_achievements(&id_text)?
        } else {
            Vec::new()
        };

        Ok(Some(JournalRecord {
            id: parse_uuid(&id_text)?,
            user_id: user_text.as_deref().map(parse_uuid).transpose()?,
            date,
            mood,
            mood_explanation,
            time_sections: self.load_sections(&id_text)?,
            health_records: self.load_health(&id_text)?,
            achievements,
        }))
    }

    fn save_entry(
        &self,
        date: CalendarDate,
        entry: &Entry,
        user_id: Option<UserId>,
    ) -> RepoResult<Option<JournalId>> {
        let journal_id = self.find_journal_id(date)?.unwrap_or_else(Uuid::new_v4);

        if self.upsert_journal(journal_id, date, entry, user_id)? == 0 {
            return Ok(None);
        }
        for (tag, section) in entry.sections.iter() {
            self.upsert_section(journal_id, tag, section)?;
        }
        self.upsert_health(journal_id, &entry.health)?;
        self.upsert_achievements(journal_id, &entry.achievements)?;

        Ok(Some(journal_id))
    }

    fn list_dates(&self) -> RepoResult<Vec<CalendarDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date FROM journals ORDER BY date DESC;")?;
        let mut rows = stmt.query([])?;
        let mut dates = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            dates.push(date_from_db(&text)?);
        }
        Ok(dates)
    }
}

/// Formats a calendar date as the stored key text.
pub fn date_to_db(date: CalendarDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_from_db(value: &str) -> RepoResult<CalendarDate> {
    CalendarDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in journals.date")))
}

fn parse_section_row(row: &Row<'_>) -> RepoResult<TimeSectionRow> {
    let activities_text: String = row.get("activities")?;
    let activities: Vec<String> = serde_json::from_str(&activities_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid time_sections.activities: {err}"))
    })?;
    let notes_text: String = row.get("activity_notes")?;
    let activity_notes: BTreeMap<String, String> = serde_json::from_str(&notes_text)
        .map_err(|err| {
            RepoError::InvalidData(format!("invalid time_sections.activity_notes: {err}"))
        })?;

    Ok(TimeSectionRow {
        section_type: row.get("section_type")?,
        time: row.get("time")?,
        medicine_time: row.get("medicine_time")?,
        medicine_taken: int_to_bool(row.get("medicine_taken")?, "medicine_taken")?,
        meal_time: row.get("meal_time")?,
        meal_items: row.get("meal_items")?,
        meal_amount: row.get("meal_amount")?,
        activities,
        activity_notes,
    })
}

fn encode_activities(activities: &BTreeSet<Activity>) -> RepoResult<String> {
    let names: Vec<&str> = activities.iter().map(|activity| activity.as_str()).collect();
    serde_json::to_string(&names)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode activities: {err}")))
}

fn encode_notes(section: &TimeSection) -> RepoResult<String> {
    serde_json::to_string(&section.activity_notes)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode activity notes: {err}")))
}

fn parse_uuid(value: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}`")))
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{date_to_db, non_empty};
    use chrono::NaiveDate;

    #[test]
    fn empty_text_maps_to_null() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty(" "), Some(" "));
    }

    #[test]
    fn date_key_is_iso_calendar_day() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(date_to_db(date), "2024-01-09");
    }
}
