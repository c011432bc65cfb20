//! Core domain logic for the daily journal.
//! Holds the entry model, debounced autosave, date-change loading and the
//! SQLite persistence behind them.

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use config::{ConfigArgs, JournalConfig};
pub use gateway::{GatewayError, LoadPath, PersistenceGateway, SqliteGateway};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::entry::{
    AchievementRecord, Activity, ActivityNoteKey, CalendarDate, Entry, HealthRecord, MealAmount,
    Mood, SectionTag, SeizureDuration, TimeSection,
};
pub use model::mutation::{AchievementField, EntryMutation, FieldGroup, HealthField, SectionField};
pub use repo::journal_repo::{
    JournalId, JournalRecord, JournalRepository, RepoError, RepoResult, SqliteJournalRepository,
    UserId,
};
pub use service::autosave::AutosaveState;
pub use service::journal::Journal;
pub use service::notify::{Notification, NotificationKind};
pub use session::{bootstrap_session, IdentityProvider, LocalIdentityProvider, SessionError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
