//! Persistence gateway seam between the journal session and storage.
//!
//! # Responsibility
//! - Define the async `load`/`save` contract used by autosave and the
//!   date-change loader.
//! - Collapse load failures into "no entry" after logging them.
//!
//! # Invariants
//! - `load` returns `None` both for "nothing stored" and for failures.
//! - `save` upserts by date and returns `Ok(true)` only when every
//!   sub-write succeeded; a failing sub-write surfaces as `Err`.
//! - Achievements are fetched only for `LoadPath::DateSelected`.

use crate::model::entry::{CalendarDate, Entry};
use crate::repo::journal_repo::{JournalRecord, RepoError};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite;

pub use sqlite::SqliteGateway;

/// Which load flow asked for the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPath {
    /// Load performed when a session opens on its initial date.
    Automatic,
    /// Load performed after an explicit date selection.
    DateSelected,
}

impl LoadPath {
    pub fn includes_achievements(self) -> bool {
        matches!(self, Self::DateSelected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::DateSelected => "date_selected",
        }
    }
}

/// Save failure reported by a gateway.
#[derive(Debug)]
pub enum GatewayError {
    Repo(RepoError),
    Unavailable(String),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "persistence unavailable: {message}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<RepoError> for GatewayError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Async persistence contract keyed by calendar date.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Fetches the stored payload for `date`.
    async fn load(&self, date: CalendarDate, path: LoadPath) -> Option<JournalRecord>;

    /// Upserts the whole entry under `date`.
    async fn save(&self, date: CalendarDate, entry: &Entry) -> Result<bool, GatewayError>;
}
