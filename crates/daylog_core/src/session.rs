//! Anonymous identity bootstrap.
//!
//! # Responsibility
//! - Establish an anonymous user before journal persistence is trusted.
//! - Keep bootstrap failures out of the user's way: they are logged only.
//!
//! # Invariants
//! - `bootstrap_session` never fails; it returns `None` on error.
//! - `LocalIdentityProvider` hands out the same user id for a database
//!   across restarts.

use crate::db::DbError;
use crate::repo::journal_repo::UserId;
use async_trait::async_trait;
use log::{error, info};
use rusqlite::{Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug)]
pub enum SessionError {
    Db(DbError),
    InvalidIdentity(String),
    Unavailable(String),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidIdentity(value) => write!(f, "stored identity is invalid: `{value}`"),
            Self::Unavailable(message) => write!(f, "identity provider unavailable: {message}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SessionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Source of anonymous sessions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_anonymously(&self) -> Result<UserId, SessionError>;
}

/// Identity provider persisting one anonymous user id in `app_identity`.
pub struct LocalIdentityProvider {
    conn: Mutex<Connection>,
}

impl LocalIdentityProvider {
    /// Wraps a migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Hands the connection back once the identity is resolved.
    pub fn into_connection(self) -> Result<Connection, SessionError> {
        self.conn
            .into_inner()
            .map_err(|_| SessionError::Unavailable("connection lock poisoned".to_string()))
    }

    fn resolve(&self) -> Result<UserId, SessionError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| SessionError::Unavailable("connection lock poisoned".to_string()))?;

        let stored: Option<String> = conn
            .query_row("SELECT user_id FROM app_identity WHERE slot = 1;", [], |row| {
                row.get(0)
            })
            .optional()?;
        if let Some(text) = stored {
            return Uuid::parse_str(&text).map_err(|_| SessionError::InvalidIdentity(text));
        }

        let user_id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO app_identity (slot, user_id) VALUES (1, ?1);",
            [user_id.to_string()],
        )?;
        Ok(user_id)
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in_anonymously(&self) -> Result<UserId, SessionError> {
        self.resolve()
    }
}

/// Signs in anonymously, logging and swallowing failures.
pub async fn bootstrap_session(provider: &dyn IdentityProvider) -> Option<UserId> {
    match provider.sign_in_anonymously().await {
        Ok(user_id) => {
            info!("event=session_bootstrap module=session status=ok user_id={user_id}");
            Some(user_id)
        }
        Err(err) => {
            error!("event=session_bootstrap module=session status=error error={err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{bootstrap_session, IdentityProvider, LocalIdentityProvider, SessionError};
    use crate::db::open_db;
    use crate::repo::journal_repo::UserId;
    use async_trait::async_trait;

    struct FailingProvider;

    #[async_trait]
    impl IdentityProvider for FailingProvider {
        async fn sign_in_anonymously(&self) -> Result<UserId, SessionError> {
            Err(SessionError::Unavailable("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn local_identity_is_stable_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.db");

        let first = LocalIdentityProvider::new(open_db(&path).unwrap());
        let first_id = bootstrap_session(&first).await.unwrap();
        drop(first);

        let second = LocalIdentityProvider::new(open_db(&path).unwrap());
        assert_eq!(bootstrap_session(&second).await, Some(first_id));
    }

    #[tokio::test]
    async fn bootstrap_failure_is_swallowed() {
        assert_eq!(bootstrap_session(&FailingProvider).await, None);
    }
}
