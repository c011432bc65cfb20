//! SQLite-backed persistence gateway.

use super::{GatewayError, LoadPath, PersistenceGateway};
use crate::db::open_db;
use crate::model::entry::{CalendarDate, Entry};
use crate::repo::journal_repo::{
    JournalRecord, JournalRepository, RepoError, SqliteJournalRepository, UserId,
};
use crate::session::{bootstrap_session, LocalIdentityProvider};
use async_trait::async_trait;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Gateway serializing all journal statements over one connection.
///
/// Async loads and saves run on the blocking pool so a slow disk never
/// stalls the runtime driving debounce timers.
pub struct SqliteGateway {
    conn: Arc<Mutex<Connection>>,
    user_id: Option<UserId>,
}

impl SqliteGateway {
    /// Wraps a migrated connection.
    pub fn new(conn: Connection, user_id: Option<UserId>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            user_id,
        }
    }

    /// Opens (and migrates) the database at `path`.
    pub fn open(path: impl AsRef<Path>, user_id: Option<UserId>) -> Result<Self, GatewayError> {
        let conn = open_db(path).map_err(RepoError::from)?;
        Ok(Self::new(conn, user_id))
    }

    /// Opens the database at `path` and tags saves with the anonymous
    /// identity stored in it.
    ///
    /// A failed bootstrap is logged and leaves saves untagged.
    pub async fn open_with_session(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let conn = open_db(path).map_err(RepoError::from)?;
        let provider = LocalIdentityProvider::new(conn);
        let user_id = bootstrap_session(&provider).await;
        let conn = provider
            .into_connection()
            .map_err(|err| GatewayError::Unavailable(err.to_string()))?;
        Ok(Self::new(conn, user_id))
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Lists stored dates, newest first.
    pub fn list_dates(&self) -> Result<Vec<CalendarDate>, GatewayError> {
        with_repo(&self.conn, |repo| Ok(repo.list_dates()?))
    }

    async fn run_blocking<T, F>(&self, task: F) -> Result<T, GatewayError>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteJournalRepository<'_>) -> Result<T, GatewayError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || with_repo(&conn, task))
            .await
            .map_err(|err| GatewayError::Unavailable(format!("storage task failed: {err}")))?
    }
}

fn with_repo<T>(
    conn: &Mutex<Connection>,
    task: impl FnOnce(&SqliteJournalRepository<'_>) -> Result<T, GatewayError>,
) -> Result<T, GatewayError> {
    let conn = conn
        .lock()
        .map_err(|_| GatewayError::Unavailable("connection lock poisoned".to_string()))?;
    let repo = SqliteJournalRepository::try_new(&conn)?;
    task(&repo)
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn load(&self, date: CalendarDate, path: LoadPath) -> Option<JournalRecord> {
        let started_at = Instant::now();
        let result = self
            .run_blocking(move |repo| Ok(repo.load_journal(date, path.includes_achievements())?))
            .await;
        match result {
            Ok(record) => {
                info!(
                    "event=journal_load module=gateway status=ok date={date} path={} found={} duration_ms={}",
                    path.as_str(),
                    record.is_some(),
                    started_at.elapsed().as_millis()
                );
                record
            }
            Err(err) => {
                error!(
                    "event=journal_load module=gateway status=error date={date} path={} duration_ms={} error={err}",
                    path.as_str(),
                    started_at.elapsed().as_millis()
                );
                None
            }
        }
    }

    async fn save(&self, date: CalendarDate, entry: &Entry) -> Result<bool, GatewayError> {
        let started_at = Instant::now();
        let entry = entry.clone();
        let user_id = self.user_id;
        let result = self
            .run_blocking(move |repo| Ok(repo.save_entry(date, &entry, user_id)?.is_some()))
            .await;
        match &result {
            Ok(saved) => info!(
                "event=journal_save module=gateway status=ok date={date} saved={saved} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=journal_save module=gateway status=error date={date} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteGateway;
    use crate::gateway::{LoadPath, PersistenceGateway};
    use crate::model::entry::{Entry, Mood};
    use crate::model::mutation::EntryMutation;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn session_identity_tags_saved_journals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daylog.db");
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let mut entry = Entry::new(date);
        entry.apply(EntryMutation::SetMood(Mood::Great));

        let gateway = SqliteGateway::open_with_session(&path).await.unwrap();
        let user_id = gateway.user_id().expect("identity bootstrapped");
        assert!(gateway.save(date, &entry).await.unwrap());
        drop(gateway);

        let reopened = SqliteGateway::open_with_session(&path).await.unwrap();
        assert_eq!(reopened.user_id(), Some(user_id));
        let record = reopened.load(date, LoadPath::Automatic).await.unwrap();
        assert_eq!(record.user_id, Some(user_id));
        assert_eq!(record.mood, "Great");
    }

    #[tokio::test]
    async fn plain_open_leaves_saves_untagged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daylog.db");
        let date = NaiveDate::from_ymd_opt(2024, 7, 5).unwrap();

        let gateway = SqliteGateway::open(&path, None).unwrap();
        assert!(gateway.save(date, &Entry::new(date)).await.unwrap());

        let record = gateway.load(date, LoadPath::Automatic).await.unwrap();
        assert_eq!(record.user_id, None);
        assert_eq!(gateway.list_dates().unwrap(), vec![date]);
    }
}
